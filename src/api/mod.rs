//! API Module
//!
//! HTTP handlers and routing for the front-end API, which serves one
//! group to clients outside the cluster.
//!
//! # Endpoints
//! - `GET /api?key=<key>` - Look a key up through the group
//! - `GET /stats` - Per-group statistics
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
