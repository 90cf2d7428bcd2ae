//! Loopback stand-ins for the Kinsta API used by integration tests.

use anyhow::Context as _;
use axum::Router;
use axum::extract::{Request, State};
use axum::middleware::{self, Next};
use axum::response::Response;
use std::net::TcpListener as StdTcpListener;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

/// An axum router served on `127.0.0.1:<ephemeral>` that counts every request it receives.
///
/// The server shuts down when [`MockApi::shutdown`] is called or the value is dropped.
pub struct MockApi {
    base_url: String,
    hits: Arc<AtomicUsize>,
    shutdown: Option<oneshot::Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl MockApi {
    /// Serve `router`; the returned base URL ends in `/v2` to mirror the production API root.
    ///
    /// # Errors
    ///
    /// Returns an error if binding a localhost port fails.
    pub async fn start(router: Router) -> anyhow::Result<Self> {
        let hits = Arc::new(AtomicUsize::new(0));
        let app = Router::new()
            .nest("/v2", router)
            .layer(middleware::from_fn_with_state(Arc::clone(&hits), count_hits));

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .context("bind mock api")?;
        let addr = listener.local_addr().context("mock api local_addr")?;

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let server = axum::serve(listener, app).with_graceful_shutdown(async move {
            let _ = shutdown_rx.await;
        });
        let handle = tokio::spawn(async move {
            let _ = server.await;
        });

        Ok(Self {
            base_url: format!("http://{addr}/v2"),
            hits,
            shutdown: Some(shutdown_tx),
            handle: Some(handle),
        })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Number of requests received so far.
    #[must_use]
    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }

    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
    }
}

impl Drop for MockApi {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }
}

async fn count_hits(State(hits): State<Arc<AtomicUsize>>, req: Request, next: Next) -> Response {
    hits.fetch_add(1, Ordering::SeqCst);
    next.run(req).await
}

/// A base URL on a localhost port nobody is listening on.
///
/// Note: the port is not reserved; another process could bind it in the meantime.
///
/// # Errors
///
/// Returns an error if binding an ephemeral localhost port fails.
pub fn closed_port_base_url() -> anyhow::Result<String> {
    let listener = StdTcpListener::bind("127.0.0.1:0").context("bind ephemeral port")?;
    let port = listener.local_addr()?.port();
    drop(listener);
    Ok(format!("http://127.0.0.1:{port}/v2"))
}
