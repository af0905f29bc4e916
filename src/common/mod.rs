pub mod config;
pub mod errors;
pub mod manifest;
pub mod session;

pub use config::{AppConfig, ConfigOverrides, ResolveSettings};
pub use errors::RunError;
pub use manifest::{write_manifest, ManifestError};
pub use session::Session;
