//! Request and Response models
//!
//! This module defines the DTOs (Data Transfer Objects) exchanged between
//! peers and served by the front-end API.

pub mod requests;
pub mod responses;
pub mod wire;

// Re-export commonly used types
pub use requests::ApiQuery;
pub use responses::{ErrorResponse, GroupStatsResponse, HealthResponse, StatsResponse};
pub use wire::{PeerRequest, PeerResponse};
