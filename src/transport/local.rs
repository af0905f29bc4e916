//! Local server bootstrap. The tunnel forwards to loopback, so nothing else
//! is ever bound.

use anyhow::Context;
use std::net::SocketAddr;

use crate::common::RunError;

fn bind_addr(port: u16) -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], port))
}

/// Starts a loopback Axum server and returns `(bound_port, handle)`.
///
/// The server runs on a background task; the handle is its shutdown hook.
pub async fn start_local_server(
    app: axum::Router,
    port: u16,
) -> Result<(u16, axum_server::Handle), RunError> {
    let addr = bind_addr(port);
    let listener = std::net::TcpListener::bind(addr).map_err(|source| {
        if source.kind() == std::io::ErrorKind::AddrInUse {
            RunError::PortInUse { port, source }
        } else {
            RunError::Unhandled(
                anyhow::Error::new(source).context(format!("Failed to bind {addr}")),
            )
        }
    })?;

    listener
        .set_nonblocking(true)
        .context("Failed to set listener to non-blocking mode")?;

    let port = listener
        .local_addr()
        .context("Failed to read bound address")?
        .port();

    // Spawn HTTP server in background
    let server_handle = axum_server::Handle::new();
    let server_handle_clone = server_handle.clone();

    tokio::spawn(async move {
        if let Err(e) = axum_server::from_tcp(listener)
            .handle(server_handle_clone)
            .serve(app.into_make_service())
            .await
        {
            tracing::error!("Server error: {}", e);
        }
    });

    tracing::info!("File server listening on {}", bind_addr(port));

    Ok((port, server_handle))
}
