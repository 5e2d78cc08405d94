//! Built-in request tracing middleware.

use std::sync::Arc;
use std::time::Instant;

use tracing::info;

use crate::handler::{BoxFuture, BoxedHandler, ErasedHandler};
use crate::middleware::Middleware;
use crate::request::Request;

/// Logs one `tracing` event per request: method, path, status, latency.
///
/// Chain it outermost so the recorded latency covers the rest of the chain:
///
/// ```rust
/// use weft::{middleware, Router};
///
/// let app = Router::new().chain(middleware::Trace);
/// ```
pub struct Trace;

impl Middleware for Trace {
    fn wrap(&self, next: BoxedHandler) -> BoxedHandler {
        Arc::new(TraceHandler { next })
    }
}

struct TraceHandler {
    next: BoxedHandler,
}

impl ErasedHandler for TraceHandler {
    fn call(&self, req: Request) -> BoxFuture {
        let next = Arc::clone(&self.next);
        Box::pin(async move {
            let method = req.method();
            let path = req.path().to_owned();
            let start = Instant::now();

            let res = next.call(req).await;

            info!(
                %method,
                %path,
                status = res.status_code(),
                elapsed_ms = start.elapsed().as_millis() as u64,
                "request",
            );
            res
        })
    }
}
