//! Run lifecycle: probe the tunnel binary, start the tunnel, resolve the
//! public URL, serve files, write the manifest, and wait for the tunnel.

use anyhow::Context;
use tracing::{debug, info, warn};

use crate::common::{write_manifest, AppConfig, RunError, Session};
use crate::output::{finish_spinner_error, finish_spinner_success, spinner};
use crate::server::{create_router, ServeState};
use crate::transport::local::start_local_server;
use crate::transport::{
    check_binary, resolve_public_url, HttpMetrics, TunnelControl, TunnelProcess,
};

/// What a successful run published.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOutcome {
    pub public_url: String,
    pub links: Vec<String>,
}

/// Runs one session to completion.
///
/// The binary probe happens before anything is spawned. Once the tunnel is
/// running, every path ends by waiting on it; failures kill it first.
pub async fn run(config: AppConfig) -> Result<RunOutcome, RunError> {
    check_binary(&config.binary).await?;

    let session = Session::new(&config);
    ensure_serve_dir(&session).await?;

    let mut tunnel = TunnelProcess::start(
        &config.binary,
        session.tunnel_port(),
        session.metrics_port(),
    )?;

    let published = publish(&session, &mut tunnel, &config).await;

    match published {
        Ok((outcome, server_handle)) => {
            let waited = wait_for_exit(&mut tunnel).await;
            // Stop accepting new connections
            server_handle.shutdown();
            info!("File server stopped");
            waited?;
            Ok(outcome)
        }
        Err(err) => {
            cleanup_after_failure(&mut tunnel).await;
            Err(err)
        }
    }
}

/// Served directory must exist before the tunnel points anything at it.
async fn ensure_serve_dir(session: &Session) -> Result<(), RunError> {
    let dir = session.serve_dir();
    let metadata = tokio::fs::metadata(dir)
        .await
        .with_context(|| format!("Served directory not found: {}", dir.display()))?;

    if !metadata.is_dir() {
        return Err(anyhow::anyhow!("Served path is not a directory: {}", dir.display()).into());
    }

    Ok(())
}

/// Resolve the public URL, start the file server, then write the manifest.
async fn publish(
    session: &Session,
    tunnel: &mut TunnelProcess,
    config: &AppConfig,
) -> Result<(RunOutcome, axum_server::Handle), RunError> {
    let metrics = HttpMetrics::new(session.metrics_port(), config.resolve.request_timeout())
        .context("Failed to build metrics client")?;
    debug!("Polling {}", metrics.url());

    let tunnel_spinner = spinner("Starting Cloudflare tunnel...");
    let public_url = match resolve_public_url(&metrics, tunnel, &config.resolve).await {
        Ok(url) => {
            finish_spinner_success(&tunnel_spinner, "Tunnel established");
            url
        }
        Err(err) => {
            finish_spinner_error(&tunnel_spinner, "Failed to establish tunnel");
            return Err(err);
        }
    };

    session.set_public_url(public_url);
    let public_url = session
        .public_url()
        .ok_or(crate::common::ManifestError::MissingPublicUrl)?
        .to_string();
    println!("[i] Public Url: {public_url}");

    let state = ServeState::new(session.serve_dir());
    let (_, server_handle) = start_local_server(create_router(&state), session.tunnel_port()).await?;

    let links = match write_manifest(
        session.public_url(),
        session.serve_dir(),
        session.manifest_path(),
    )
    .await
    {
        Ok(links) => links,
        Err(err) => {
            server_handle.shutdown();
            return Err(err.into());
        }
    };

    for link in &links {
        info!("{}", link);
    }
    println!(
        "[+] File Is Ready! {} link(s) written to {}",
        links.len(),
        session.manifest_path().display()
    );

    Ok((RunOutcome { public_url, links }, server_handle))
}

enum Stop {
    Exited,
    Interrupted,
    SignalUnavailable,
}

/// Block until the tunnel exits, or kill it on Ctrl+C.
async fn wait_for_exit(tunnel: &mut TunnelProcess) -> Result<(), RunError> {
    let stop = tokio::select! {
        status = tunnel.wait() => {
            let status = status?;
            warn!("Tunnel process exited ({}); public links are no longer reachable", status);
            Stop::Exited
        }
        result = tokio::signal::ctrl_c() => match result {
            Ok(()) => {
                info!("Ctrl+C received - shutting down tunnel");
                Stop::Interrupted
            }
            Err(e) => {
                tracing::error!("Failed to listen for Ctrl+C: {}", e);
                Stop::SignalUnavailable
            }
        },
    };

    match stop {
        Stop::Exited => {}
        Stop::Interrupted => {
            tunnel.kill().await?;
            tunnel.wait().await?;
        }
        Stop::SignalUnavailable => {
            tunnel.wait().await?;
        }
    }

    Ok(())
}

async fn cleanup_after_failure(tunnel: &mut TunnelProcess) {
    if let Err(e) = tunnel.kill().await {
        warn!("Error during tunnel shutdown: {}", e);
    }
    if let Err(e) = tunnel.wait().await {
        warn!("Error waiting for tunnel process: {}", e);
    }
}
