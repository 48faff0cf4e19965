//! HTTP surface: `POST /api/generate` and its `GET` readiness probe.
pub mod handlers;
pub mod routes;

pub use routes::{router, AppState};
