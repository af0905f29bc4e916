//! Public URL discovery by polling the tunnel's metrics endpoint.

use regex::Regex;
use std::sync::LazyLock;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::common::config::ResolveSettings;
use crate::common::RunError;
use crate::transport::cloudflare::TunnelControl;

static PUBLIC_URL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"https?://\S+\.trycloudflare\.com").expect("public url pattern is valid")
});

/// Returns the first quick tunnel URL found in free-form metrics text.
pub fn extract_public_url(text: &str) -> Option<&str> {
    PUBLIC_URL_PATTERN.find(text).map(|m| m.as_str())
}

#[derive(Debug, Error)]
pub enum FetchError {
    /// Nothing is listening yet; expected while the tunnel boots
    #[error("metrics endpoint unreachable: {0}")]
    Unreachable(String),
    #[error("metrics request failed: {0}")]
    Request(String),
}

/// Source of metrics page bodies.
#[async_trait::async_trait]
pub trait MetricsSource: Send + Sync {
    async fn fetch(&self) -> Result<String, FetchError>;
}

/// `GET http://localhost:<port>/metrics` over reqwest.
pub struct HttpMetrics {
    client: reqwest::Client,
    url: String,
}

impl HttpMetrics {
    pub fn new(metrics_port: u16, request_timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()?;

        Ok(Self {
            client,
            url: metrics_url(metrics_port),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

pub fn metrics_url(metrics_port: u16) -> String {
    format!("http://localhost:{metrics_port}/metrics")
}

#[async_trait::async_trait]
impl MetricsSource for HttpMetrics {
    async fn fetch(&self) -> Result<String, FetchError> {
        let response = self.client.get(&self.url).send().await.map_err(|err| {
            if err.is_connect() {
                FetchError::Unreachable(err.to_string())
            } else {
                FetchError::Request(err.to_string())
            }
        })?;

        // body is scanned whatever the status code
        response
            .text()
            .await
            .map_err(|err| FetchError::Request(err.to_string()))
    }
}

/// Polls `source` until it yields a public URL or the attempt budget runs out.
///
/// A connection failure sleeps for the retry interval before the next attempt.
/// A body without a match counts as an attempt and is retried immediately.
/// On exhaustion the tunnel is killed once and
/// [`RunError::ResolutionTimeout`] is returned.
pub async fn resolve_public_url<M, T>(
    source: &M,
    tunnel: &mut T,
    settings: &ResolveSettings,
) -> Result<String, RunError>
where
    M: MetricsSource + ?Sized,
    T: TunnelControl + ?Sized,
{
    let max_attempts = settings.max_attempts;

    for attempt in 1..=max_attempts {
        match source.fetch().await {
            Ok(body) => {
                if let Some(url) = extract_public_url(&body) {
                    info!("Public URL resolved on attempt {}/{}", attempt, max_attempts);
                    return Ok(url.to_string());
                }
                debug!(
                    "No public URL in metrics yet (attempt {}/{})",
                    attempt, max_attempts
                );
            }
            Err(err) => {
                match &err {
                    // silence connect errors, expected while the tunnel boots
                    FetchError::Unreachable(_) => debug!(
                        "Metrics attempt {}/{} failed: {}",
                        attempt, max_attempts, err
                    ),
                    FetchError::Request(_) => warn!(
                        "Metrics attempt {}/{} failed: {}",
                        attempt, max_attempts, err
                    ),
                }
                if attempt < max_attempts {
                    tokio::time::sleep(settings.retry_interval()).await;
                }
            }
        }
    }

    if let Err(e) = tunnel.kill().await {
        warn!("Failed to kill tunnel process after resolution timeout: {}", e);
    }

    Err(RunError::ResolutionTimeout {
        attempts: max_attempts,
    })
}
