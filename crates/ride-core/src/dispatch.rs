//! Notifications sent after a ride changes status.
//!
//! | Transition | Channel                | Event                      |
//! |------------|------------------------|----------------------------|
//! | accept     | passenger's user       | `ride.accepted`            |
//! | reject     | passenger's user       | `ride.rejectedByDriver`    |
//! | cancel     | driver's user, if any  | `ride.cancelledByPassenger`|
//!
//! Start and complete notify nobody. Delivery failures never reach the
//! caller: the transition is already committed when the dispatcher runs.

use crate::bus::EventPublisher;
use crate::channel::ChannelKey;
use crate::directory::{Profile, UserDirectory};
use crate::message::Event;
use crate::ride::{Ride, RideStatus, UserId};
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, warn};

/// Event names carried on user and ride channels.
pub mod events {
    pub const RIDE_ACCEPTED: &str = "ride.accepted";
    pub const RIDE_REJECTED_BY_DRIVER: &str = "ride.rejectedByDriver";
    pub const RIDE_CANCELLED_BY_PASSENGER: &str = "ride.cancelledByPassenger";
    pub const DRIVER_LOCATION_UPDATE: &str = "driverLocationUpdate";
}

/// A status change requested on a ride.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Accept,
    Reject,
    Start,
    Complete,
    Cancel,
}

impl Transition {
    /// Verb used in errors and logs.
    #[must_use]
    pub fn action(self) -> &'static str {
        match self {
            Transition::Accept => "accept",
            Transition::Reject => "reject",
            Transition::Start => "start",
            Transition::Complete => "complete",
            Transition::Cancel => "cancel",
        }
    }

    /// Status the ride ends up in.
    #[must_use]
    pub fn target_status(self) -> RideStatus {
        match self {
            Transition::Accept => RideStatus::Accepted,
            Transition::Reject => RideStatus::CancelledByDriver,
            Transition::Start => RideStatus::InProgress,
            Transition::Complete => RideStatus::Completed,
            Transition::Cancel => RideStatus::CancelledByPassenger,
        }
    }
}

/// Publishes ride notifications to the affected user's channel.
pub struct NotificationDispatcher {
    publisher: Arc<dyn EventPublisher>,
    directory: Arc<dyn UserDirectory>,
}

impl NotificationDispatcher {
    #[must_use]
    pub fn new(publisher: Arc<dyn EventPublisher>, directory: Arc<dyn UserDirectory>) -> Self {
        Self {
            publisher,
            directory,
        }
    }

    /// Notify the other party of a committed transition.
    pub async fn dispatch(&self, transition: Transition, ride: &Ride) {
        let (target, name, payload) = match transition {
            Transition::Accept | Transition::Reject => {
                let Some(driver_id) = ride.driver_id else {
                    warn!(
                        ride = ride.id,
                        action = transition.action(),
                        "Ride has no driver to announce"
                    );
                    return;
                };
                let name = if transition == Transition::Accept {
                    events::RIDE_ACCEPTED
                } else {
                    events::RIDE_REJECTED_BY_DRIVER
                };
                let driver = self.driver(driver_id).await;
                let payload = json!({
                    "rideId": ride.id,
                    "status": ride.status,
                    "driver": {
                        "id": driver_id,
                        "name": driver.as_ref().map(Profile::full_name),
                        "phone": driver.and_then(|d| d.phone),
                    },
                });
                (ChannelKey::User(ride.passenger_id), name, payload)
            }
            Transition::Cancel => {
                let Some(driver_id) = ride.driver_id else {
                    debug!(ride = ride.id, "No driver assigned, nobody to notify");
                    return;
                };
                let passenger = self.passenger(ride.passenger_id).await;
                let payload = json!({
                    "rideId": ride.id,
                    "status": ride.status,
                    "passenger": {
                        "id": ride.passenger_id,
                        "name": passenger.as_ref().map(Profile::full_name),
                    },
                });
                (
                    ChannelKey::User(driver_id),
                    events::RIDE_CANCELLED_BY_PASSENGER,
                    payload,
                )
            }
            Transition::Start | Transition::Complete => return,
        };

        self.send(Event::new(target, name, payload));
    }

    fn send(&self, event: Event) {
        let channel = event.channel;
        let name = event.name.clone();
        match self.publisher.publish(event) {
            Ok(recipients) => {
                debug!(channel = %channel, event = %name, recipients, "Notification sent");
            }
            Err(e) => {
                warn!(channel = %channel, event = %name, error = %e, "Failed to send notification");
            }
        }
    }

    async fn driver(&self, id: UserId) -> Option<Profile> {
        self.directory
            .find_driver(id)
            .await
            .unwrap_or_else(|e| {
                warn!(driver = id, error = %e, "Driver lookup failed");
                None
            })
    }

    async fn passenger(&self, id: UserId) -> Option<Profile> {
        self.directory
            .find_passenger(id)
            .await
            .unwrap_or_else(|e| {
                warn!(passenger = id, error = %e, "Passenger lookup failed");
                None
            })
    }
}
