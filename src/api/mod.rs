//! HTTP API for relay tasks.

pub mod model;
pub mod routes;

pub use routes::{ApiState, SESSION_HEADER, relay_routes};
