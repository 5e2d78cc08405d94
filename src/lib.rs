//! # weft
//!
//! A minimal HTTP framework built around one idea: the router is the whole
//! framework. Registration builds an ordered table of regex-compiled routes;
//! dispatch scans it, extracts path variables, runs the middleware chain, and
//! calls your handler. Everything else — the hyper server, the response
//! types, the health probes — exists to feed that loop.
//!
//! ## Routing model
//!
//! Path specs are literal paths with `(name:regex)` capture groups:
//!
//! - `/users/(id:[0-9]+)` — leaf route, matched exactly (`^…$`); `id` is
//!   available as `req.param("id")`, always a raw string.
//! - Routes match in **registration order**, first match wins. There is no
//!   specificity scoring: register `/users/new` before `/users/(id:[a-z0-9]+)`
//!   or the capture will shadow it.
//! - A matched path with no binding for the verb is `405`; an unmatched path
//!   is `404`. Both still pass through the middleware chain.
//! - [`Router::subrouter`] mounts a nested router under a prefix. The mount
//!   boundary must be a path separator: a child at `/api` serves `/api/x`
//!   but not `/apix`.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use weft::{middleware, Request, Response, Router, Server, Status};
//!
//! #[tokio::main]
//! async fn main() {
//!     let app = Router::new()
//!         .chain(middleware::Trace)
//!         .get("/users/(id:[0-9]+)", get_user)
//!         .post("/users", create_user)
//!         .subrouter("/api", |api| {
//!             api.get("/widgets", list_widgets)
//!         });
//!
//!     Server::bind("0.0.0.0:3000").serve(app).await.unwrap();
//! }
//!
//! async fn get_user(req: Request) -> Response {
//!     let id = req.param("id").unwrap_or("unknown");
//!     Response::json(format!(r#"{{"id":"{id}"}}"#).into_bytes())
//! }
//!
//! async fn create_user(req: Request) -> Response {
//!     if req.body().is_empty() {
//!         return Response::status(Status::BadRequest);
//!     }
//!     # let bytes: Vec<u8> = vec![];
//!     Response::builder()
//!         .status(Status::Created)
//!         .header("location", "/users/99")
//!         .json(bytes)
//! }
//!
//! async fn list_widgets(_req: Request) -> Response {
//!     Response::json(br#"[]"#.to_vec())
//! }
//! ```
//!
//! ## What weft does not do
//!
//! No glob syntax beyond the regex groups, no parameter type coercion, no
//! trailing-slash redirects, and no route mutation after startup — the table
//! is built once, then shared read-only across connections.

mod error;
mod handler;
mod method;
mod pattern;
mod request;
mod response;
mod router;
mod server;
mod status;

pub mod health;
pub mod middleware;

pub use error::Error;
pub use handler::Handler;
pub use method::Method;
pub use middleware::{Middleware, Next};
pub use request::{Params, Request};
pub use response::{ContentType, IntoResponse, Response};
pub use router::Router;
pub use server::Server;
pub use status::Status;
