use axum::{extract::State, routing::get, Router};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Local stand-in for the tunnel's metrics page.
pub struct MetricsStub {
    pub port: u16,
    hits: Arc<AtomicUsize>,
    task: tokio::task::JoinHandle<()>,
}

impl MetricsStub {
    /// Serves `body` on `GET /metrics` once more than `silent_hits` requests
    /// have been answered with an empty page.
    pub async fn start(body: &str, silent_hits: usize) -> Self {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind metrics stub");
        let port = listener.local_addr().expect("stub addr").port();
        let hits = Arc::new(AtomicUsize::new(0));

        let state = (hits.clone(), body.to_string(), silent_hits);
        let app = Router::new()
            .route("/metrics", get(metrics))
            .with_state(state);

        let task = tokio::spawn(async move {
            axum::serve(listener, app).await.expect("metrics stub server");
        });

        Self { port, hits, task }
    }

    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }
}

impl Drop for MetricsStub {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn metrics(
    State((hits, body, silent_hits)): State<(Arc<AtomicUsize>, String, usize)>,
) -> String {
    let seen = hits.fetch_add(1, Ordering::SeqCst);
    if seen < silent_hits {
        "# HELP build_info cloudflared build\nbuild_info 1\n".to_string()
    } else {
        body
    }
}

/// A free loopback port, released before returning.
pub fn free_port() -> u16 {
    std::net::TcpListener::bind("127.0.0.1:0")
        .and_then(|l| l.local_addr())
        .map(|a| a.port())
        .expect("free port")
}
