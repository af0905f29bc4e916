#![allow(dead_code)]

pub mod config_test_utils;
pub mod metrics_stub;

use local2public::transport::metrics::{FetchError, MetricsSource};
use local2public::transport::TunnelControl;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tempfile::TempDir;

pub fn setup_temp_dir() -> TempDir {
    TempDir::new().expect("Failed to create temp directory")
}

/// Tunnel stand-in that only counts kill calls.
#[derive(Clone, Default)]
pub struct FakeTunnel {
    kills: Arc<AtomicUsize>,
}

impl FakeTunnel {
    pub fn kill_count(&self) -> usize {
        self.kills.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl TunnelControl for FakeTunnel {
    async fn kill(&mut self) -> anyhow::Result<()> {
        self.kills.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Metrics source replaying a fixed script, one entry per fetch. Once the
/// script runs out the last entry repeats.
pub struct ScriptedMetrics {
    script: Vec<Result<String, FetchError>>,
    calls: AtomicUsize,
}

impl ScriptedMetrics {
    pub fn new(script: Vec<Result<String, FetchError>>) -> Self {
        assert!(!script.is_empty(), "script needs at least one entry");
        Self {
            script,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

pub fn unreachable() -> Result<String, FetchError> {
    Err(FetchError::Unreachable("connection refused".to_string()))
}

pub fn body(text: &str) -> Result<String, FetchError> {
    Ok(text.to_string())
}

#[async_trait::async_trait]
impl MetricsSource for ScriptedMetrics {
    async fn fetch(&self) -> Result<String, FetchError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        let entry = &self.script[call.min(self.script.len() - 1)];
        match entry {
            Ok(text) => Ok(text.clone()),
            Err(FetchError::Unreachable(msg)) => Err(FetchError::Unreachable(msg.clone())),
            Err(FetchError::Request(msg)) => Err(FetchError::Request(msg.clone())),
        }
    }
}
