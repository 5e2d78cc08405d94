//! HTTP server and graceful shutdown.
//!
//! The server is deliberately thin: it owns the listener, the connection
//! tasks and the shutdown sequence, converts between the hyper types and
//! weft's [`Request`]/[`Response`], and hands every request to
//! [`Router::dispatch`]. All routing decisions live in the router.
//!
//! On SIGTERM (Kubernetes pod termination) or Ctrl-C it stops accepting,
//! lets every in-flight connection task run to completion, then returns from
//! [`Server::serve`] so `main` can exit cleanly. Set
//! `terminationGracePeriodSeconds` longer than your slowest request.

use std::net::SocketAddr;
use std::str::FromStr;
use std::sync::Arc;

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::service::service_fn;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as ConnBuilder;
use tokio::net::TcpListener;
use tracing::{error, info};

use crate::error::Error;
use crate::method::Method;
use crate::request::Request;
use crate::router::Router;

/// The HTTP server.
pub struct Server {
    addr: SocketAddr,
}

impl Server {
    /// Configures the server to bind to `addr` when [`serve`](Server::serve)
    /// is called.
    ///
    /// # Panics
    ///
    /// Panics if `addr` is not a valid `host:port` string.
    pub fn bind(addr: &str) -> Self {
        let addr: SocketAddr = addr.parse().expect("invalid socket address");
        Self { addr }
    }

    /// Starts accepting connections and dispatching them through `router`.
    ///
    /// Returns only after a full graceful shutdown (SIGTERM or Ctrl-C,
    /// followed by all in-flight requests completing).
    pub async fn serve(self, router: Router) -> Result<(), Error> {
        let listener = TcpListener::bind(self.addr).await?;

        // The route table is immutable from here on; Arc shares it across
        // connection tasks without copying.
        let router = Arc::new(router);

        info!(addr = %self.addr, "weft listening");

        // JoinSet tracks every connection task so shutdown can drain them.
        let mut tasks = tokio::task::JoinSet::new();

        let shutdown = shutdown_signal();
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                // `biased` checks arms top-to-bottom: a shutdown signal stops
                // the accept loop even when connections are queued.
                biased;

                () = &mut shutdown => {
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

                    let router = Arc::clone(&router);
                    let io = TokioIo::new(stream);

                    tasks.spawn(async move {
                        // One service call per request on the connection.
                        let svc = service_fn(move |req| {
                            let router = Arc::clone(&router);
                            async move { handle(router, req).await }
                        });

                        // auto::Builder speaks whichever of HTTP/1.1 and
                        // HTTP/2 the client negotiates.
                        if let Err(e) = ConnBuilder::new(TokioExecutor::new())
                            .serve_connection(io, svc)
                            .await
                        {
                            error!(peer = %remote_addr, "connection error: {e}");
                        }
                    });
                }

                // Reap finished tasks so the JoinSet stays bounded.
                Some(_) = tasks.join_next(), if !tasks.is_empty() => {}
            }
        }

        while tasks.join_next().await.is_some() {}

        info!("weft stopped");
        Ok(())
    }
}

// ── Request handling ──────────────────────────────────────────────────────────

/// Converts one hyper request, dispatches it, converts the response back.
///
/// The error type is [`Infallible`](std::convert::Infallible): every failure
/// becomes an HTTP status here, hyper never sees an error.
async fn handle(
    router: Arc<Router>,
    req: hyper::Request<hyper::body::Incoming>,
) -> Result<http::Response<Full<Bytes>>, std::convert::Infallible> {
    let (parts, body) = req.into_parts();

    // Methods outside RFC 9110 never reach the router.
    let Ok(method) = Method::from_str(parts.method.as_str()) else {
        return Ok(status_only(http::StatusCode::METHOD_NOT_ALLOWED));
    };

    let path = parts.uri.path().to_owned();
    let headers = parts.headers.iter()
        .map(|(k, v)| {
            (k.as_str().to_owned(), String::from_utf8_lossy(v.as_bytes()).into_owned())
        })
        .collect();

    let body = match body.collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) => {
            error!("body read error: {e}");
            return Ok(status_only(http::StatusCode::BAD_REQUEST));
        }
    };

    let request = Request::new(method, path, headers, body);
    let response = router.dispatch(request).await;

    Ok(response.into_http())
}

fn status_only(status: http::StatusCode) -> http::Response<Full<Bytes>> {
    let mut res = http::Response::new(Full::default());
    *res.status_mut() = status;
    res
}

// ── Shutdown signal ───────────────────────────────────────────────────────────

/// Resolves on the first shutdown signal the process receives.
///
/// On Unix this listens for both **SIGTERM** (sent by the Kubernetes control
/// plane) and **SIGINT** (Ctrl-C, for local dev). On Windows only Ctrl-C is
/// available.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let sigterm = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    // Never resolves: disables the SIGTERM arm on non-Unix platforms.
    #[cfg(not(unix))]
    let sigterm = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c   => {}
        () = sigterm  => {}
    }
}
