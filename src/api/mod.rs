//! HTTP API: handlers, routing and error responses

pub mod handlers;
pub mod routes;

pub use handlers::AppState;
pub use routes::build_router;
