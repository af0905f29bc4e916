//! Failure kinds surfaced by the top-level run sequence.

use thiserror::Error;

use super::manifest::ManifestError;

/// Exit code used when the tunnel never reported a public URL.
pub const RESOLUTION_TIMEOUT_EXIT_CODE: i32 = 2;

#[derive(Debug, Error)]
pub enum RunError {
    #[error(
        "Cloudflare's Tunnel service ({binary}) is not installed. Please install it before continuing."
    )]
    BinaryMissing { binary: String },

    #[error("Failed to get Public Url after {attempts} attempts")]
    ResolutionTimeout { attempts: u32 },

    #[error(transparent)]
    Manifest(#[from] ManifestError),

    #[error(
        "Failed to bind to port {port} - port already in use.\n\n\
         Is another local2public instance running?\n\
         Or is another service using this port?"
    )]
    PortInUse {
        port: u16,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Unhandled(#[from] anyhow::Error),
}

impl RunError {
    /// Process exit status for this failure.
    pub fn exit_code(&self) -> i32 {
        match self {
            RunError::ResolutionTimeout { .. } => RESOLUTION_TIMEOUT_EXIT_CODE,
            RunError::BinaryMissing { .. }
            | RunError::Manifest(_)
            | RunError::PortInUse { .. }
            | RunError::Unhandled(_) => 1,
        }
    }
}
