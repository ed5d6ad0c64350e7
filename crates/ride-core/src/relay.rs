//! Driver location relay.
//!
//! Samples are forwarded as they arrive to everyone tracking the ride, minus
//! the sender. Nothing is stored and nothing is deduplicated.

use crate::bus::EventPublisher;
use crate::channel::ChannelKey;
use crate::dispatch::events;
use crate::message::{ConnectionId, Event};
use crate::ride::RideId;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, trace, warn};

/// Forwards location samples onto ride channels.
#[derive(Clone)]
pub struct LocationRelay {
    publisher: Arc<dyn EventPublisher>,
}

impl LocationRelay {
    #[must_use]
    pub fn new(publisher: Arc<dyn EventPublisher>) -> Self {
        Self { publisher }
    }

    /// Relay one sample from `source`.
    ///
    /// Returns the number of connections it was addressed to, or `None` when
    /// the sample was dropped.
    pub fn relay(
        &self,
        source: &ConnectionId,
        ride_id: Option<RideId>,
        location: Option<Value>,
    ) -> Option<usize> {
        let (ride_id, location) = match (ride_id, location) {
            (Some(ride_id), Some(location)) if !location.is_null() => (ride_id, location),
            _ => {
                debug!(connection = %source, "Dropping location sample without ride or location");
                return None;
            }
        };

        let event = Event::new(
            ChannelKey::Ride(ride_id),
            events::DRIVER_LOCATION_UPDATE,
            json!({ "rideId": ride_id, "location": location }),
        )
        .with_source(source.clone());

        match self.publisher.publish(event) {
            Ok(recipients) => {
                trace!(ride = ride_id, connection = %source, recipients, "Location relayed");
                Some(recipients)
            }
            Err(e) => {
                warn!(ride = ride_id, connection = %source, error = %e, "Failed to relay location");
                None
            }
        }
    }
}
