//-----------------------------------------------------
// HELPER FUNCTIONS
//-----------------------------------------------------

use crate::error::{ApiError, ErrorResponse};
use crate::inventory::ParentKind;
use crate::models::LastAction;
use serde::Serialize;
use std::convert::Infallible;
use std::sync::{Arc, PoisonError, RwLock};
use warp::http::StatusCode;
use warp::reply::Response;
use warp::{Filter, Reply};

// Helper functions for response generation
pub fn success_response<T: Serialize>(body: &T) -> Response {
    warp::reply::with_status(warp::reply::json(body), StatusCode::OK).into_response()
}

pub fn error_response(error: &ApiError) -> Response {
    warp::reply::with_status(
        warp::reply::json(&ErrorResponse::from(error)),
        error.status_code(),
    )
    .into_response()
}

pub fn no_content_response() -> Response {
    warp::reply::with_status(warp::reply(), StatusCode::NO_CONTENT).into_response()
}

// Create a middleware filter that tracks actions
pub fn with_action_tracking(
    action_name: &'static str,
    action_tracker: Arc<RwLock<Option<LastAction>>>,
) -> impl Filter<Extract = (), Error = Infallible> + Clone {
    warp::any()
        .map(move || {
            let mut last_action = action_tracker
                .write()
                .unwrap_or_else(PoisonError::into_inner);
            *last_action = Some(LastAction::new(action_name.to_string()));
        })
        .untuple_one()
}

/// Builds and parses the hrefs handed out by the API
#[derive(Debug, Clone)]
pub struct HrefBuilder {
    base_url: String,
}

impl HrefBuilder {
    pub fn new(base_url: &str) -> Self {
        HrefBuilder {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn snapshots(&self, kind: ParentKind, parent_id: u64) -> String {
        format!(
            "{}/api/{}/{}/snapshots",
            self.base_url,
            kind.collection(),
            parent_id
        )
    }

    pub fn snapshot(&self, kind: ParentKind, parent_id: u64, snapshot_id: u64) -> String {
        format!("{}/{}", self.snapshots(kind, parent_id), snapshot_id)
    }

    pub fn task(&self, task_id: &str) -> String {
        format!("{}/api/tasks/{}", self.base_url, task_id)
    }

    /// Split a snapshot href into (kind, parent id, snapshot id)
    ///
    /// Accepts absolute hrefs on any host as well as bare paths such as
    /// `/api/vms/1/snapshots/2`. Ids are returned unparsed so that lookups
    /// can report them verbatim.
    pub fn parse_snapshot(href: &str) -> Option<(ParentKind, String, String)> {
        let path = match href.find("://") {
            Some(pos) => {
                let rest = &href[pos + 3..];
                &rest[rest.find('/')?..]
            }
            None => href,
        };
        let path = path.split(['?', '#']).next().unwrap_or(path);

        let segments: Vec<&str> = path.trim_matches('/').split('/').collect();
        match segments.as_slice() {
            [.., "api", collection, parent_id, "snapshots", snapshot_id]
                if !parent_id.is_empty() && !snapshot_id.is_empty() =>
            {
                let kind = collection.parse::<ParentKind>().ok()?;
                Some((kind, parent_id.to_string(), snapshot_id.to_string()))
            }
            _ => None,
        }
    }
}
