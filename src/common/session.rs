//! State of one run: where files come from, which ports are used, and the
//! public URL once the tunnel reports it.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use super::config::AppConfig;

pub struct Session {
    tunnel_port: u16,
    metrics_port: u16,
    serve_dir: PathBuf,
    manifest_path: PathBuf,
    public_url: OnceLock<String>,
}

impl Session {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            tunnel_port: config.tunnel_port,
            metrics_port: config.metrics_port,
            serve_dir: config.serve_dir.clone(),
            manifest_path: config.manifest_path.clone(),
            public_url: OnceLock::new(),
        }
    }

    pub fn tunnel_port(&self) -> u16 {
        self.tunnel_port
    }

    pub fn metrics_port(&self) -> u16 {
        self.metrics_port
    }

    pub fn serve_dir(&self) -> &Path {
        &self.serve_dir
    }

    pub fn manifest_path(&self) -> &Path {
        &self.manifest_path
    }

    /// Records the public URL. Returns `false` if one was already set; the
    /// first value is kept.
    pub fn set_public_url(&self, url: String) -> bool {
        let accepted = self.public_url.set(url).is_ok();
        if !accepted {
            tracing::warn!("Public URL already set, ignoring new value");
        }
        accepted
    }

    pub fn public_url(&self) -> Option<&str> {
        self.public_url.get().map(String::as_str)
    }
}
