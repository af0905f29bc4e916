//! Cloudflare quick tunnel process management.

use anyhow::{Context, Result};
use std::process::{ExitStatus, Stdio};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, ChildStderr, Command};
use tracing::{debug, info};

use crate::common::RunError;

/// Handle to a running tunnel process that can be force-terminated.
#[async_trait::async_trait]
pub trait TunnelControl: Send {
    /// Force-terminates the process. Killing an exited process is not an error.
    async fn kill(&mut self) -> Result<()>;
}

/// Fails with [`RunError::BinaryMissing`] unless `<binary> --version` exits
/// successfully. Output is discarded.
pub async fn check_binary(binary: &str) -> Result<(), RunError> {
    let status = Command::new(binary)
        .arg("--version")
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await;

    match status {
        Ok(status) if status.success() => {
            debug!("{} is available", binary);
            Ok(())
        }
        Ok(status) => {
            debug!("{} --version exited with {}", binary, status);
            Err(RunError::BinaryMissing {
                binary: binary.to_string(),
            })
        }
        Err(err) => {
            debug!("failed to run {} --version: {}", binary, err);
            Err(RunError::BinaryMissing {
                binary: binary.to_string(),
            })
        }
    }
}

/// Arguments that make the tunnel forward `tunnel_port` and publish metrics on
/// `metrics_port`.
pub fn tunnel_args(tunnel_port: u16, metrics_port: u16) -> Vec<String> {
    vec![
        "tunnel".to_string(),
        "--url".to_string(),
        format!("localhost:{tunnel_port}"),
        "--metrics".to_string(),
        format!("localhost:{metrics_port}"),
    ]
}

/// The single tunnel subprocess owned by a run.
pub struct TunnelProcess {
    process: Child,
}

impl TunnelProcess {
    /// Spawns the tunnel binary. Must be called from within a tokio runtime.
    #[tracing::instrument(skip(binary))]
    pub fn start(binary: &str, tunnel_port: u16, metrics_port: u16) -> Result<Self> {
        let mut child = Command::new(binary)
            .args(tunnel_args(tunnel_port, metrics_port))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .with_context(|| format!("Failed to spawn {binary} process"))?;

        // log stderr for debugging
        if let Some(stderr) = child.stderr.take() {
            tokio::spawn(log_stderr(stderr));
        }

        info!(pid = ?child.id(), "Tunnel process started");

        Ok(Self { process: child })
    }

    /// Blocks until the tunnel process exits.
    pub async fn wait(&mut self) -> Result<ExitStatus> {
        let status = self
            .process
            .wait()
            .await
            .context("Failed to wait for tunnel process")?;
        info!("Tunnel process exited with status: {}", status);
        Ok(status)
    }

    pub fn id(&self) -> Option<u32> {
        self.process.id()
    }
}

#[async_trait::async_trait]
impl TunnelControl for TunnelProcess {
    async fn kill(&mut self) -> Result<()> {
        if let Some(status) = self
            .process
            .try_wait()
            .context("Failed to poll tunnel process")?
        {
            debug!("Tunnel process already exited ({}), nothing to kill", status);
            return Ok(());
        }

        match self.process.kill().await {
            Ok(()) => Ok(()),
            // tokio reports an already reaped child as InvalidInput
            Err(e) if e.kind() == std::io::ErrorKind::InvalidInput => Ok(()),
            Err(e) => Err(e).context("Failed to kill tunnel process"),
        }
    }
}

// Cloudflare only uses stderr for logging
async fn log_stderr(stderr: ChildStderr) {
    let reader = BufReader::new(stderr);
    let mut lines = reader.lines();

    // errors will contain error/fatal
    while let Some(line) = lines.next_line().await.ok().flatten() {
        let lowercase_line = line.to_lowercase();
        if lowercase_line.contains("error") || lowercase_line.contains("fatal") {
            tracing::error!("cloudflared stderr: {}", line);
        } else {
            tracing::trace!("cloudflared stderr: {}", line);
        }
    }
}
