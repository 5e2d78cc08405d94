//! Minimal weft example — regex captures, a sub-router, and tracing.
//!
//! Run with:
//!   RUST_LOG=info cargo run --example basic
//!
//! Try:
//!   curl http://localhost:3000/users/42
//!   curl -X POST http://localhost:3000/users \
//!        -H 'content-type: application/json' \
//!        -d '{"name":"alice"}'
//!   curl http://localhost:3000/api/widgets/7
//!   curl http://localhost:3000/healthz

use weft::{health, middleware, Request, Response, Router, Server, Status};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let app = Router::new()
        .chain(middleware::Trace)
        .get("/users/(id:[0-9]+)", get_user)
        .post("/users", create_user)
        .subrouter("/api", |api| {
            api.get("/widgets/(id:[0-9]+)", get_widget)
        })
        .get("/healthz", health::liveness)
        .get("/readyz", health::readiness);

    Server::bind("0.0.0.0:3000")
        .serve(app)
        .await
        .expect("server error");
}

// GET /users/(id:[0-9]+)
async fn get_user(req: Request) -> Response {
    let id = req.param("id").unwrap_or("unknown");
    Response::json(format!(r#"{{"id":"{id}","name":"alice"}}"#).into_bytes())
}

// POST /users
//
// req.body() is &[u8] — parse with serde_json::from_slice or whatever you
// like; weft does not touch the bytes.
async fn create_user(req: Request) -> Response {
    if req.body().is_empty() {
        return Response::status(Status::BadRequest);
    }

    Response::builder()
        .status(Status::Created)
        .header("location", "/users/99")
        .json(r#"{"id":"99","name":"new_user"}"#.to_owned().into_bytes())
}

// GET /api/widgets/(id:[0-9]+) — resolved by the sub-router against the
// full path; the capture still comes out of req.param.
async fn get_widget(req: Request) -> Response {
    let id = req.param("id").unwrap_or("unknown");
    Response::json(format!(r#"{{"widget":"{id}"}}"#).into_bytes())
}
