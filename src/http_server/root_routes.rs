//! Root route.

use axum::{extract::State, routing::get, Router};

use super::state::AppState;

pub const GREETING: &str = "===helloooooooo====";

/// Create the `/` route
pub fn root_routes(state: AppState) -> Router {
    Router::new()
        .route("/", get(root_handler))
        .with_state(state)
}

async fn root_handler(State(state): State<AppState>) -> &'static str {
    state.logger.info("Root endpoint accessed");
    GREETING
}
