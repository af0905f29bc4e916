//! Configuration schema, defaults, and layered loading.
//!
//! Precedence: defaults < config < environment < CLI
use anyhow::{ensure, Context, Result};
use directories::ProjectDirs;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

pub const ENV_PREFIX: &str = "LOCAL2PUBLIC_";

const DEFAULT_BINARY: &str = "cloudflared";
const DEFAULT_TUNNEL_PORT: u16 = 1234;
const DEFAULT_METRICS_PORT: u16 = 3214;
const DEFAULT_SERVE_DIR: &str = "toupload";
const DEFAULT_MANIFEST_PATH: &str = "links.txt";

pub fn config_path() -> PathBuf {
    ProjectDirs::from("", "", "local2public")
        .map(|p| p.config_dir().join("config.toml"))
        .unwrap_or_else(|| PathBuf::from("local2public.toml"))
}

/// Retry budget for public URL discovery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolveSettings {
    /// Metrics polls before giving up
    pub max_attempts: u32,
    /// Sleep after a failed connection, in milliseconds
    pub retry_interval_ms: u64,
    /// Upper bound for a single metrics request, in milliseconds
    pub request_timeout_ms: u64,
}

impl ResolveSettings {
    pub fn retry_interval(&self) -> Duration {
        Duration::from_millis(self.retry_interval_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

impl Default for ResolveSettings {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            retry_interval_ms: 500,
            request_timeout_ms: 2000,
        }
    }
}

/// Fully resolved application configuration after all layers merge.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Tunnel executable name or path
    pub binary: String,
    /// Local port the tunnel forwards and the file server binds
    pub tunnel_port: u16,
    /// Local port for the tunnel's metrics endpoint
    pub metrics_port: u16,
    pub serve_dir: PathBuf,
    pub manifest_path: PathBuf,
    pub resolve: ResolveSettings,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            binary: DEFAULT_BINARY.to_string(),
            tunnel_port: DEFAULT_TUNNEL_PORT,
            metrics_port: DEFAULT_METRICS_PORT,
            serve_dir: PathBuf::from(DEFAULT_SERVE_DIR),
            manifest_path: PathBuf::from(DEFAULT_MANIFEST_PATH),
            resolve: ResolveSettings::default(),
        }
    }
}

impl AppConfig {
    /// Rejects port and retry values the run sequence cannot work with.
    pub fn validate(&self) -> Result<()> {
        ensure!(
            !self.binary.trim().is_empty(),
            "Invalid config: binary must not be empty"
        );
        ensure!(
            self.tunnel_port != 0,
            "Invalid config: tunnel_port must be > 0"
        );
        ensure!(
            self.metrics_port != 0,
            "Invalid config: metrics_port must be > 0"
        );
        ensure!(
            self.tunnel_port != self.metrics_port,
            "Invalid config: tunnel_port and metrics_port must differ (both {})",
            self.tunnel_port
        );
        ensure!(
            self.resolve.max_attempts >= 1,
            "Invalid config: resolve.max_attempts must be >= 1"
        );
        ensure!(
            self.resolve.request_timeout_ms > 0,
            "Invalid config: resolve.request_timeout_ms must be > 0"
        );
        Ok(())
    }
}

/// Values supplied on the command line; unset fields keep lower layers.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConfigOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub binary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tunnel_port: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metrics_port: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub serve_dir: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manifest_path: Option<PathBuf>,
}

/// Loads config from defaults/file/env.
pub fn load_config() -> Result<AppConfig> {
    let path = config_path();

    let config: AppConfig = Figment::new()
        .merge(Serialized::defaults(AppConfig::default()))
        .merge(Toml::file(&path))
        .merge(Env::prefixed(ENV_PREFIX).split("__"))
        .extract()
        .with_context(|| format!("Failed to load configuration from {}", path.display()))?;

    config.validate()?;

    Ok(config)
}

/// Applies runtime overrides to a loaded config and re-validates it.
pub fn apply_overrides(mut config: AppConfig, overrides: &ConfigOverrides) -> Result<AppConfig> {
    if let Some(binary) = &overrides.binary {
        config.binary = binary.clone();
    }
    if let Some(port) = overrides.tunnel_port {
        config.tunnel_port = port;
    }
    if let Some(port) = overrides.metrics_port {
        config.metrics_port = port;
    }
    if let Some(dir) = &overrides.serve_dir {
        config.serve_dir = dir.clone();
    }
    if let Some(path) = &overrides.manifest_path {
        config.manifest_path = path.clone();
    }

    config.validate()?;
    Ok(config)
}
