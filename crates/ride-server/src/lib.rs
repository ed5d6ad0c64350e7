//! # Ridecast Server
//!
//! HTTP API for the ride lifecycle plus the realtime channel that carries
//! ride notifications and driver locations.

pub mod api;
pub mod config;
pub mod handlers;
pub mod metrics;

pub use config::Config;
pub use handlers::{app, run_server, AppState};
