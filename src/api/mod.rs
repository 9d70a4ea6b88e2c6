//! HTTP API module: the route table, its handlers and response middleware.

pub mod handlers;
pub mod middleware;
pub mod routes;

pub use routes::create_router;
