//! # Ridecast Server
//!
//! Ride lifecycle API and realtime dispatch server.
//!
//! ## Usage
//!
//! ```bash
//! # Run with default settings
//! ridecast
//!
//! # Run with environment variables
//! RIDECAST_PORT=8080 RIDECAST_HOST=0.0.0.0 ridecast
//!
//! # Override a nested key
//! RIDECAST_LIMITS__MAX_SUBSCRIPTIONS_PER_CONNECTION=20 ridecast
//! ```

use anyhow::Result;
use ridecast_server::{config, handlers};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ridecast=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = config::Config::load()?;

    tracing::info!("Starting Ridecast server on {}:{}", config.host, config.port);

    handlers::run_server(config).await?;

    Ok(())
}
