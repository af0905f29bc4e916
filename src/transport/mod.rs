pub mod cloudflare;
pub mod local;
pub mod metrics;

pub use cloudflare::{check_binary, TunnelControl, TunnelProcess};
pub use metrics::{extract_public_url, resolve_public_url, HttpMetrics, MetricsSource};
