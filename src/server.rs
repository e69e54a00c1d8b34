//! HTTP server and graceful shutdown.
//!
//! The server owns the socket and nothing else. Every request is handed to
//! [`Registry::handle`]; the registry is shared read-only across connection
//! tasks, so no lock sits on the request path.
//!
//! On SIGTERM or Ctrl-C the server:
//! 1. Stops calling `listener.accept()`.
//! 2. Tells every open connection to finish. Idle keep-alive connections
//!    close at once; busy ones close after their current response.
//! 3. Waits up to the drain timeout, then aborts whatever is left.
//! 4. Returns from [`Server::serve`].

use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use http_body_util::Full;
use hyper::body::Incoming;
use hyper::service::service_fn;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as ConnBuilder;
use hyper_util::server::graceful::GracefulShutdown;
use tokio::net::TcpListener;
use tracing::{debug, error, info, warn};

use crate::error::Error;
use crate::registry::Registry;

const DEFAULT_DRAIN_TIMEOUT: Duration = Duration::from_secs(30);

/// The HTTP server.
pub struct Server {
    listener: TcpListener,
    addr: SocketAddr,
    drain_timeout: Duration,
}

impl Server {
    /// Binds a listener on `addr` (`host:port`; port `0` picks a free one).
    ///
    /// ```rust,no_run
    /// # async fn run() -> Result<(), resty::Error> {
    /// use resty::{Registry, Server};
    ///
    /// Server::bind("0.0.0.0:3000").await?.serve(Registry::new()).await
    /// # }
    /// ```
    pub async fn bind(addr: &str) -> Result<Self, Error> {
        let addr: SocketAddr = addr.parse().map_err(|_| Error::InvalidAddress(addr.to_owned()))?;
        let listener = TcpListener::bind(addr).await?;
        let addr = listener.local_addr()?;
        Ok(Self { listener, addr, drain_timeout: DEFAULT_DRAIN_TIMEOUT })
    }

    /// The address actually bound.
    pub fn local_addr(&self) -> SocketAddr {
        self.addr
    }

    /// How long shutdown waits for open connections before aborting them.
    /// Defaults to 30 seconds.
    pub fn with_drain_timeout(mut self, timeout: Duration) -> Self {
        self.drain_timeout = timeout;
        self
    }

    /// Serves `registry` until SIGTERM or Ctrl-C, then drains.
    pub async fn serve(self, registry: Registry) -> Result<(), Error> {
        self.serve_with_shutdown(registry, shutdown_signal()).await
    }

    /// Serves `registry` until `signal` resolves, then drains open
    /// connections and returns.
    pub async fn serve_with_shutdown(
        self,
        registry: Registry,
        signal: impl Future<Output = ()>,
    ) -> Result<(), Error> {
        let Self { listener, addr, drain_timeout } = self;
        let registry = Arc::new(registry);

        info!(addr = %addr, resources = registry.len(), "resty listening");

        let builder = ConnBuilder::new(TokioExecutor::new());
        let graceful = GracefulShutdown::new();
        let mut tasks = tokio::task::JoinSet::new();

        tokio::pin!(signal);

        loop {
            tokio::select! {
                // Shutdown is checked first so a signal stops accepting at
                // once, even with connections queued.
                biased;

                () = &mut signal => {
                    info!(in_flight = tasks.len(), "shutdown signal received, draining connections");
                    break;
                }

                res = listener.accept() => {
                    let (stream, remote_addr) = match res {
                        Ok(v) => v,
                        Err(e) => {
                            error!("accept error: {e}");
                            continue;
                        }
                    };
                    debug!(peer = %remote_addr, "connection accepted");

                    let registry = Arc::clone(&registry);
                    let io = TokioIo::new(stream);

                    // Called once per request on the connection.
                    let svc = service_fn(move |req: http::Request<Incoming>| {
                        let registry = Arc::clone(&registry);
                        async move {
                            let response = registry.handle(req).await;
                            Ok::<http::Response<Full<Bytes>>, Infallible>(response.into_inner())
                        }
                    });

                    let conn = graceful.watch(builder.serve_connection(io, svc).into_owned());
                    tasks.spawn(async move {
                        if let Err(e) = conn.await {
                            error!(peer = %remote_addr, "connection error: {e}");
                        }
                    });
                }

                // Reap finished connection tasks.
                Some(_) = tasks.join_next(), if !tasks.is_empty() => {}
            }
        }

        let drain = async {
            graceful.shutdown().await;
            while tasks.join_next().await.is_some() {}
        };
        if tokio::time::timeout(drain_timeout, drain).await.is_err() {
            warn!(remaining = tasks.len(), timeout = ?drain_timeout, "drain timed out, aborting connections");
            tasks.abort_all();
            while tasks.join_next().await.is_some() {}
        }

        info!("resty stopped");
        Ok(())
    }
}

// ── Shutdown signal ───────────────────────────────────────────────────────────

/// Resolves on the first SIGTERM or SIGINT (Ctrl-C only on Windows).
///
/// A handler that cannot be installed is logged and never fires.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("failed to install Ctrl-C handler: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let sigterm = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let sigterm = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c   => {}
        () = sigterm  => {}
    }
}
