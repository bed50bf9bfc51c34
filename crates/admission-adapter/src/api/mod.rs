use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

pub(crate) mod api_error;
pub(crate) mod handlers;
pub(crate) mod state;

pub use api_error::AdapterError;

use handlers::{readiness_handler, review_handler};
use state::ApiServerState;

pub(crate) const READINESS_PATH: &str = "/readiness";

pub(crate) fn router(state: Arc<ApiServerState>, webhook_path: &str) -> Router {
    Router::new()
        .route(webhook_path, post(review_handler))
        .route(READINESS_PATH, get(readiness_handler))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}
