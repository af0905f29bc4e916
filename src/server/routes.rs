//! Router definition for the file server

use axum::{routing::get, Router};

use super::{handlers, ServeState};

/// One route: a single path segment naming a file in the served directory.
/// Everything else falls through to 404.
pub fn create_router(state: &ServeState) -> Router {
    Router::new()
        .route("/:file", get(handlers::serve_file))
        .with_state(state.clone())
}
