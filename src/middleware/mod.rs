//! Middleware layer.
//!
//! A middleware wraps the next handler in the chain and returns a new
//! handler: it may work before and after invoking the wrapped handler, or
//! decline to invoke it at all (short-circuit). The chain wraps whatever the
//! router resolved — including the internal 404/405 fallbacks — so every
//! request traverses every registered middleware.
//!
//! Ordering: the middleware chained **first** runs **outermost**. With
//! `.chain(a).chain(b)`, `a` sees the request first and the response last.
//!
//! Most middleware is written with [`from_fn`]:
//!
//! ```rust
//! use weft::{middleware, Next, Request, Response, Router};
//!
//! let app = Router::new()
//!     .chain(middleware::from_fn(|req: Request, next: Next| async move {
//!         if req.header("authorization").is_none() {
//!             return Response::status(weft::Status::Unauthorized);
//!         }
//!         next.run(req).await
//!     }))
//!     .chain(middleware::Trace);
//! ```
//!
//! For middleware that carries configuration or state, implement
//! [`Middleware`] on your own type — [`Trace`] is the in-tree example.

mod trace;

pub use trace::Trace;

use std::future::Future;
use std::sync::Arc;

use crate::handler::{BoxFuture, BoxedHandler, ErasedHandler};
use crate::request::Request;
use crate::response::Response;

// ── Middleware trait ──────────────────────────────────────────────────────────

/// A handler-wrapping layer in the router's chain.
///
/// `wrap` is called once per request with the next handler in the chain and
/// returns the handler that should run in its place. The `#[doc(hidden)]`
/// types involved are the same erased-handler machinery route handlers use;
/// prefer [`from_fn`] unless you need a configured struct.
pub trait Middleware: Send + Sync + 'static {
    #[doc(hidden)]
    fn wrap(&self, next: BoxedHandler) -> BoxedHandler;
}

// ── Next ──────────────────────────────────────────────────────────────────────

/// The rest of the chain, handed to [`from_fn`] middleware.
///
/// Call [`Next::run`] to continue; drop it to short-circuit.
pub struct Next(pub(crate) BoxedHandler);

impl Next {
    /// Invokes the wrapped handler (and everything chained after it).
    pub async fn run(self, req: Request) -> Response {
        self.0.call(req).await
    }
}

// ── from_fn ───────────────────────────────────────────────────────────────────

/// Builds a [`Middleware`] from an async function over `(Request, Next)`.
pub fn from_fn<F, Fut>(f: F) -> impl Middleware
where
    F: Fn(Request, Next) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Response> + Send + 'static,
{
    FromFn(Arc::new(f))
}

struct FromFn<F>(Arc<F>);

impl<F, Fut> Middleware for FromFn<F>
where
    F: Fn(Request, Next) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Response> + Send + 'static,
{
    fn wrap(&self, next: BoxedHandler) -> BoxedHandler {
        Arc::new(AroundHandler { f: Arc::clone(&self.0), next })
    }
}

/// The handler a [`from_fn`] middleware produces: calls the user function
/// with a fresh [`Next`] per request.
struct AroundHandler<F> {
    f: Arc<F>,
    next: BoxedHandler,
}

impl<F, Fut> ErasedHandler for AroundHandler<F>
where
    F: Fn(Request, Next) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Response> + Send + 'static,
{
    fn call(&self, req: Request) -> BoxFuture {
        let fut = (self.f)(req, Next(Arc::clone(&self.next)));
        Box::pin(fut)
    }
}
