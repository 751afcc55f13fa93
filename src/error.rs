// error.rs
// Structural API errors and their JSON envelope

use serde::Serialize;
use thiserror::Error;
use warp::http::StatusCode;

/// Errors that abort a request before any per-resource result is produced.
///
/// Domain failures (missing snapshot name, disconnected parent) are not
/// errors: they travel as `success: false` action results under HTTP 200.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ApiError {
    #[error("Couldn't find {model} with 'id'={id}")]
    NotFound { model: String, id: String },

    #[error("{0}")]
    BadRequest(String),

    #[error("Authentication failed: a valid X-API-Key header is required")]
    Unauthorized,

    #[error("Forbidden")]
    Forbidden,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl warp::reject::Reject for ApiError {}

pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    pub fn not_found(model: impl Into<String>, id: impl Into<String>) -> Self {
        ApiError::NotFound {
            model: model.into(),
            id: id.into(),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::NotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Machine-readable error kind, stable across releases
    pub fn kind(&self) -> &'static str {
        match self {
            ApiError::NotFound { .. } => "not_found",
            ApiError::BadRequest(_) => "bad_request",
            ApiError::Unauthorized => "unauthorized",
            ApiError::Forbidden => "forbidden",
            ApiError::Internal(_) => "internal_server_error",
        }
    }

    /// Category of the failure
    pub fn klass(&self) -> &'static str {
        match self {
            ApiError::NotFound { .. } => "RecordNotFound",
            ApiError::BadRequest(_) => "BadRequestError",
            ApiError::Unauthorized => "AuthenticationError",
            ApiError::Forbidden => "ForbiddenError",
            ApiError::Internal(_) => "InternalError",
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub kind: String,
    pub message: String,
    pub klass: String,
}

/// `{"error": {"kind", "message", "klass"}}`
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

impl From<&ApiError> for ErrorResponse {
    fn from(err: &ApiError) -> Self {
        ErrorResponse {
            error: ErrorBody {
                kind: err.kind().to_string(),
                message: err.to_string(),
                klass: err.klass().to_string(),
            },
        }
    }
}
