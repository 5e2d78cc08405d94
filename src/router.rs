//! Regex request router.
//!
//! Routes are kept in registration order and scanned linearly: the first
//! route whose anchored pattern matches the path wins, and scanning never
//! continues past it — even when the matched route has no binding for the
//! request's method (that is a 405, not a reason to keep looking). There is
//! no specificity scoring; register the more specific spec first.
//!
//! Two registrations that resolve to the same prefix + name-stripped spec
//! share one route: the second adds a method binding to the first's entry.
//!
//! The table is built once at startup and is read-only while serving, so the
//! server shares it across connection tasks behind a plain `Arc`.

use std::sync::Arc;

use regex::Regex;
use tracing::error;

use crate::handler::{BoxFuture, BoxedHandler, ErasedHandler, Handler};
use crate::method::Method;
use crate::middleware::Middleware;
use crate::pattern;
use crate::request::{Params, Request};
use crate::response::Response;
use crate::status::Status;

// ── Route table ───────────────────────────────────────────────────────────────

/// One compiled route: its identity, matcher, extractors and method bindings.
///
/// A binding's method is `None` for the `ALL` wildcard. Exact-method bindings
/// win over the wildcard at dispatch time regardless of registration order.
struct Route {
    key: String,
    pattern: Regex,
    vars: Vec<String>,
    bindings: Vec<(Option<Method>, BoxedHandler)>,
}

/// What the dispatcher resolved a `(path, method)` pair to.
enum Resolved {
    Matched(BoxedHandler, Params),
    /// Pattern matched but a declared variable's group did not participate
    /// in the match. A route-spec authoring bug; answered 500, never a
    /// silently wrong capture.
    ExtractionFailed,
    NotFound,
    MethodNotAllowed,
}

// ── Router ────────────────────────────────────────────────────────────────────

/// The application router.
///
/// Path specs are literal paths with `(name:regex)` capture groups:
///
/// ```rust,no_run
/// # use weft::{Request, Response, Router};
/// # async fn get_user(_: Request) -> Response { Response::text("") }
/// # async fn create_user(_: Request) -> Response { Response::text("") }
/// let app = Router::new()
///     .get("/users/(id:[0-9]+)", get_user)
///     .post("/users", create_user);
/// ```
///
/// Build it once at startup; pass it to [`Server::serve`](crate::Server::serve).
/// Each registration returns `self` so calls chain naturally. A malformed
/// spec panics at the registration that introduced it — bad routes abort
/// startup, they never wait for traffic.
pub struct Router {
    prefix: String,
    routes: Vec<Route>,
    middlewares: Vec<Arc<dyn Middleware>>,
}

impl Router {
    pub fn new() -> Self {
        Self::with_prefix(String::new())
    }

    fn with_prefix(prefix: String) -> Self {
        Self { prefix, routes: Vec::new(), middlewares: Vec::new() }
    }

    // ── Registration ─────────────────────────────────────────────────────────

    /// Registers `handler` for `GET` requests matching `spec`.
    pub fn get(self, spec: &str, handler: impl Handler) -> Self {
        self.on(Method::Get, spec, handler)
    }

    /// Registers `handler` for `POST` requests matching `spec`.
    pub fn post(self, spec: &str, handler: impl Handler) -> Self {
        self.on(Method::Post, spec, handler)
    }

    /// Registers `handler` for `PUT` requests matching `spec`.
    pub fn put(self, spec: &str, handler: impl Handler) -> Self {
        self.on(Method::Put, spec, handler)
    }

    /// Registers `handler` for `DELETE` requests matching `spec`.
    pub fn delete(self, spec: &str, handler: impl Handler) -> Self {
        self.on(Method::Delete, spec, handler)
    }

    /// Registers `handler` for `PATCH` requests matching `spec`.
    pub fn patch(self, spec: &str, handler: impl Handler) -> Self {
        self.on(Method::Patch, spec, handler)
    }

    /// Registers a handler for a method + spec pair. Returns `self` for chaining.
    pub fn on(self, method: Method, spec: &str, handler: impl Handler) -> Self {
        self.bind(Some(method), spec, handler.into_boxed_handler())
    }

    /// Registers `handler` for **every** method matching `spec`.
    ///
    /// The wildcard is a fallback: an exact-method binding on the same route
    /// is preferred when the request's verb has one.
    pub fn all(self, spec: &str, handler: impl Handler) -> Self {
        self.bind(None, spec, handler.into_boxed_handler())
    }

    /// Appends `middleware` to the chain.
    ///
    /// The middleware chained first runs outermost: it sees the request
    /// first and the response last. The chain also wraps the 404/405
    /// fallbacks, so every request traverses it.
    pub fn chain(mut self, middleware: impl Middleware) -> Self {
        self.middlewares.push(Arc::new(middleware));
        self
    }

    /// Mounts a nested router under `spec`.
    ///
    /// The child owns an independent route table and middleware chain; its
    /// specs compile under the accumulated prefix (capture-group names
    /// stripped), so it matches against the full, unmodified request path.
    /// On the parent this registers a wildcard delegation route whose
    /// boundary is a path separator or end-of-path: `/api` and `/api/x`
    /// reach a child mounted at `/api`, `/apix` does not.
    ///
    /// ```rust,no_run
    /// # use weft::{Request, Response, Router};
    /// # async fn list_widgets(_: Request) -> Response { Response::text("") }
    /// let app = Router::new().subrouter("/api", |api| {
    ///     api.get("/widgets", list_widgets)
    /// });
    /// ```
    pub fn subrouter(self, spec: &str, configure: impl FnOnce(Router) -> Router) -> Self {
        let normalized = pattern::normalize(spec)
            .unwrap_or_else(|e| panic!("invalid subrouter spec: {e}"));
        let child = Router::with_prefix(format!("{}{normalized}", self.prefix));
        let child = configure(child);

        let delegation = format!("{}/", spec.trim_end_matches('/'));
        self.bind(None, &delegation, Arc::new(Delegate(Arc::new(child))))
    }

    fn bind(mut self, method: Option<Method>, spec: &str, handler: BoxedHandler) -> Self {
        let compiled = pattern::compile(&self.prefix, spec)
            .unwrap_or_else(|e| panic!("invalid route: {e}"));

        match self.routes.iter_mut().find(|r| r.key == compiled.key) {
            Some(route) => route.bindings.push((method, handler)),
            None => self.routes.push(Route {
                key: compiled.key,
                pattern: compiled.pattern,
                vars: compiled.vars,
                bindings: vec![(method, handler)],
            }),
        }
        self
    }

    // ── Dispatch ─────────────────────────────────────────────────────────────

    /// Routes one request through the middleware chain to its handler.
    ///
    /// This is the entry point the bundled [`Server`](crate::Server) calls,
    /// and also how a parent router hands a request to a mounted child.
    pub async fn dispatch(&self, mut req: Request) -> Response {
        let handler = match self.resolve(req.method, &req.path) {
            Resolved::Matched(handler, params) => {
                req.params = params;
                handler
            }
            Resolved::NotFound => status_handler(Status::NotFound),
            Resolved::MethodNotAllowed => status_handler(Status::MethodNotAllowed),
            Resolved::ExtractionFailed => status_handler(Status::InternalServerError),
        };

        let handler = self.middlewares.iter().rev()
            .fold(handler, |next, mw| mw.wrap(next));

        handler.call(req).await
    }

    fn resolve(&self, method: Method, path: &str) -> Resolved {
        for route in &self.routes {
            if !route.pattern.is_match(path) {
                continue;
            }

            // First path match wins; only the method search continues below.
            let handler = route.bindings.iter()
                .find(|(m, _)| *m == Some(method))
                .or_else(|| route.bindings.iter().find(|(m, _)| m.is_none()))
                .map(|(_, h)| Arc::clone(h));

            let Some(handler) = handler else {
                return Resolved::MethodNotAllowed;
            };

            return match pattern::extract(&route.pattern, &route.vars, path) {
                Some(params) => Resolved::Matched(handler, params),
                None => {
                    error!(%method, path, "path variable extraction failed on a matched route");
                    Resolved::ExtractionFailed
                }
            };
        }
        Resolved::NotFound
    }
}

impl Default for Router {
    fn default() -> Self { Self::new() }
}

/// Status-only fallback handler (404 / 405 / 500).
fn status_handler(status: Status) -> BoxedHandler {
    (move |_req: Request| async move { Response::status(status) }).into_boxed_handler()
}

// ── Delegation adapter ────────────────────────────────────────────────────────

/// Makes a mounted child router callable exactly like a leaf handler.
struct Delegate(Arc<Router>);

impl ErasedHandler for Delegate {
    fn call(&self, req: Request) -> BoxFuture {
        let router = Arc::clone(&self.0);
        Box::pin(async move { router.dispatch(req).await })
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use bytes::Bytes;

    use super::*;
    use crate::middleware::{self, Next};

    fn req(method: Method, path: &str) -> Request {
        Request::new(method, path.to_owned(), Vec::new(), Bytes::new())
    }

    async fn ok(_req: Request) -> Response {
        Response::status(Status::Ok)
    }

    fn body_of(res: &Response) -> &str {
        std::str::from_utf8(&res.body).unwrap()
    }

    #[tokio::test]
    async fn root_router_status_taxonomy() {
        let app = Router::new().get("/", ok);

        let cases = [
            (Method::Get, "/", 200),
            (Method::Post, "/", 405),
            (Method::Get, "/missing", 404),
        ];
        for (method, path, want) in cases {
            let res = app.dispatch(req(method, path)).await;
            assert_eq!(res.status_code(), want, "{method} {path}");
        }
    }

    #[tokio::test]
    async fn same_spec_merges_into_one_route() {
        let app = Router::new()
            .get("/h", |_req: Request| async { Response::text("get") })
            .post("/h", |_req: Request| async { Response::text("post") });

        assert_eq!(app.routes.len(), 1);
        assert_eq!(app.routes[0].bindings.len(), 2);

        let res = app.dispatch(req(Method::Get, "/h")).await;
        assert_eq!(body_of(&res), "get");
        let res = app.dispatch(req(Method::Post, "/h")).await;
        assert_eq!(body_of(&res), "post");
    }

    #[tokio::test]
    async fn all_matches_every_method() {
        let app = Router::new().all("/any", ok);

        for method in [Method::Get, Method::Post, Method::Put, Method::Delete, Method::Patch] {
            let res = app.dispatch(req(method, "/any")).await;
            assert_eq!(res.status_code(), 200, "{method}");
        }
    }

    #[tokio::test]
    async fn exact_method_binding_beats_the_wildcard() {
        let app = Router::new()
            .all("/m", |_req: Request| async { Response::text("all") })
            .get("/m", |_req: Request| async { Response::text("get") });

        let res = app.dispatch(req(Method::Get, "/m")).await;
        assert_eq!(body_of(&res), "get");
        let res = app.dispatch(req(Method::Post, "/m")).await;
        assert_eq!(body_of(&res), "all");
    }

    #[tokio::test]
    async fn first_path_match_stops_the_scan() {
        // The catch-all matches every path, so the GET route behind it is
        // unreachable: a GET to /x is a 405, not a fallthrough.
        let app = Router::new()
            .post("/(rest:.+)", ok)
            .get("/x", ok);

        let res = app.dispatch(req(Method::Get, "/x")).await;
        assert_eq!(res.status_code(), 405);
        let res = app.dispatch(req(Method::Post, "/x")).await;
        assert_eq!(res.status_code(), 200);
    }

    #[tokio::test]
    async fn captures_are_ordered_and_disjoint() {
        async fn echo(req: Request) -> Response {
            let id = req.param("id").unwrap_or("?");
            let id2 = req.param("id2").unwrap_or("?");
            Response::text(format!("{id} {id2}"))
        }

        let app = Router::new()
            .get("/test/(id:[0-9]+)", echo)
            .get("/test/(id:[0-9]+)/test/(id2:[0-9]+)", echo);

        // Leaf anchoring sends the longer path past the shorter route.
        let res = app.dispatch(req(Method::Get, "/test/1")).await;
        assert_eq!(body_of(&res), "1 ?");

        let res = app.dispatch(req(Method::Get, "/test/1/test/2")).await;
        assert_eq!(body_of(&res), "1 2");

        let res = app.dispatch(req(Method::Get, "/test/12/test/3")).await;
        assert_eq!(body_of(&res), "12 3");
    }

    #[tokio::test]
    async fn captures_ignore_lookalike_literal_text() {
        // The literal `/v1/` would satisfy `[0-9]+` under a naive search;
        // the capture must come from the group's own segment.
        let app = Router::new().get("/v1/items/(id:[0-9]+)", |req: Request| async move {
            Response::text(req.param("id").unwrap_or("?").to_owned())
        });

        let res = app.dispatch(req(Method::Get, "/v1/items/7")).await;
        assert_eq!(res.status_code(), 200);
        assert_eq!(body_of(&res), "7");
    }

    #[tokio::test]
    async fn greedy_capture_cannot_starve_a_later_group() {
        async fn echo_xy(req: Request) -> Response {
            let x = req.param("x").unwrap_or("?");
            let y = req.param("y").unwrap_or("?");
            Response::text(format!("{x} {y}"))
        }

        let app = Router::new().get("/(x:.*)/(y:z)", echo_xy);

        let res = app.dispatch(req(Method::Get, "/z/z")).await;
        assert_eq!(res.status_code(), 200);
        assert_eq!(body_of(&res), "z z");
    }

    #[tokio::test]
    async fn starved_capture_answers_500() {
        // The trailing `?` makes the group optional, so the pattern can
        // match without the variable participating; that must surface as a
        // 500, never an empty or lookalike capture.
        let app = Router::new().get("/opt/(id:[0-9]+)?", ok);

        let res = app.dispatch(req(Method::Get, "/opt/")).await;
        assert_eq!(res.status_code(), 500);

        let res = app.dispatch(req(Method::Get, "/opt/5")).await;
        assert_eq!(res.status_code(), 200);
    }

    #[tokio::test]
    async fn anonymous_groups_consume_but_capture_nothing() {
        async fn assert_no_params(req: Request) -> Response {
            assert!(req.params().is_empty());
            Response::status(Status::Ok)
        }

        let app = Router::new().get("/files/([0-9]+)", assert_no_params);

        let res = app.dispatch(req(Method::Get, "/files/12")).await;
        assert_eq!(res.status_code(), 200);
        let res = app.dispatch(req(Method::Get, "/files/ab")).await;
        assert_eq!(res.status_code(), 404);
    }

    #[tokio::test]
    async fn subrouter_respects_the_separator_boundary() {
        let app = Router::new().subrouter("/api", |api| api.get("/widgets", ok));

        let res = app.dispatch(req(Method::Get, "/api/widgets")).await;
        assert_eq!(res.status_code(), 200);

        // Nothing is bound at the mount point itself.
        let res = app.dispatch(req(Method::Get, "/api")).await;
        assert_eq!(res.status_code(), 404);
        // The boundary must be a separator, not a shared prefix.
        let res = app.dispatch(req(Method::Get, "/apiwidgets")).await;
        assert_eq!(res.status_code(), 404);
        // The child's leaf is anchored too.
        let res = app.dispatch(req(Method::Get, "/api/widgets/7")).await;
        assert_eq!(res.status_code(), 404);
    }

    #[tokio::test]
    async fn subrouter_method_fallbacks_come_from_the_child() {
        let app = Router::new().subrouter("/sub", |sub| sub.get("/test", ok));

        let res = app.dispatch(req(Method::Post, "/sub/test")).await;
        assert_eq!(res.status_code(), 405);
        let res = app.dispatch(req(Method::Get, "/sub/_test")).await;
        assert_eq!(res.status_code(), 404);
    }

    #[tokio::test]
    async fn nested_subrouters_accumulate_prefixes() {
        let app = Router::new().subrouter("/api", |api| {
            api.subrouter("/v1", |v1| v1.get("/items/(id:[0-9]+)", |req: Request| async move {
                Response::text(req.param("id").unwrap_or("?").to_owned())
            }))
        });

        let res = app.dispatch(req(Method::Get, "/api/v1/items/7")).await;
        assert_eq!(res.status_code(), 200);
        assert_eq!(body_of(&res), "7");

        let res = app.dispatch(req(Method::Get, "/v1/items/7")).await;
        assert_eq!(res.status_code(), 404);
    }

    fn marker(tag: &'static str, log: Arc<Mutex<Vec<String>>>) -> impl Middleware {
        middleware::from_fn(move |req: Request, next: Next| {
            let log = Arc::clone(&log);
            async move {
                log.lock().unwrap().push(format!("{tag}:before"));
                let res = next.run(req).await;
                log.lock().unwrap().push(format!("{tag}:after"));
                res
            }
        })
    }

    #[tokio::test]
    async fn middleware_first_chained_runs_outermost() {
        let log = Arc::new(Mutex::new(Vec::new()));

        let handler_log = Arc::clone(&log);
        let app = Router::new()
            .chain(marker("a", Arc::clone(&log)))
            .chain(marker("b", Arc::clone(&log)))
            .get("/", move |_req: Request| {
                let log = Arc::clone(&handler_log);
                async move {
                    log.lock().unwrap().push("handler".to_owned());
                    Response::status(Status::Ok)
                }
            });

        app.dispatch(req(Method::Get, "/")).await;

        let got = log.lock().unwrap().clone();
        assert_eq!(got, ["a:before", "b:before", "handler", "b:after", "a:after"]);
    }

    #[tokio::test]
    async fn middleware_wraps_the_fallback_handlers_too() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let app = Router::new().chain(marker("m", Arc::clone(&log)));

        let res = app.dispatch(req(Method::Get, "/nowhere")).await;
        assert_eq!(res.status_code(), 404);
        let got = log.lock().unwrap().clone();
        assert_eq!(got, ["m:before", "m:after"]);
    }

    #[tokio::test]
    async fn middleware_can_short_circuit() {
        let app = Router::new()
            .chain(middleware::from_fn(|req: Request, next: Next| async move {
                if req.header("authorization").is_none() {
                    return Response::status(Status::Unauthorized);
                }
                next.run(req).await
            }))
            .get("/secret", ok);

        let res = app.dispatch(req(Method::Get, "/secret")).await;
        assert_eq!(res.status_code(), 401);

        let mut authed = req(Method::Get, "/secret");
        authed.headers.push(("authorization".to_owned(), "yes".to_owned()));
        let res = app.dispatch(authed).await;
        assert_eq!(res.status_code(), 200);
    }

    #[tokio::test]
    async fn child_middleware_runs_inside_the_parents() {
        let log = Arc::new(Mutex::new(Vec::new()));

        let parent_log = Arc::clone(&log);
        let child_log = Arc::clone(&log);
        let app = Router::new()
            .chain(marker("parent", parent_log))
            .subrouter("/api", move |api| {
                api.chain(marker("child", child_log)).get("/x", ok)
            });

        app.dispatch(req(Method::Get, "/api/x")).await;

        let got = log.lock().unwrap().clone();
        assert_eq!(got, ["parent:before", "child:before", "child:after", "parent:after"]);
    }

    #[test]
    #[should_panic(expected = "invalid route")]
    fn malformed_spec_panics_at_registration() {
        let _ = Router::new().get("/bad/(id:[0-9+)", ok);
    }
}
