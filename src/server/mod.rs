// Submodules
pub mod handlers;
pub mod routes;

use std::path::{Path, PathBuf};
use std::sync::Arc;

pub use routes::create_router;

/// Shared, read-only state for file handlers.
#[derive(Clone)]
pub struct ServeState {
    dir: Arc<PathBuf>,
}

impl ServeState {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: Arc::new(dir.into()),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}
