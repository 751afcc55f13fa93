// handlers/health.rs
// Health handler

use crate::models::{HealthResponse, LastAction};
use std::sync::{Arc, PoisonError, RwLock};
use warp::{Rejection, Reply};

/// GET /health
/// No authentication required
pub async fn health_check_handler(
    last_action: Arc<RwLock<Option<LastAction>>>,
) -> Result<impl Reply, Rejection> {
    let last_action_data = last_action
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .clone();

    let response = HealthResponse {
        status: "success".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        last_action: last_action_data,
    };

    Ok(warp::reply::json(&response))
}
