//! # ridecast-core
//!
//! Ride lifecycle and realtime dispatch for Ridecast.
//!
//! This crate provides the fundamental building blocks:
//!
//! - **Ride** - Ride model, status graph and request validation
//! - **Store** - Persistence boundary with an atomic conditional update
//! - **Lifecycle** - Ride state machine (accept, reject, start, complete, cancel)
//! - **Bus** - Channel membership and best-effort event delivery
//! - **Dispatch** - Notifications sent after a committed transition
//! - **Relay** - Driver location forwarding onto ride channels
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │ HTTP caller │────▶│  Lifecycle  │────▶│  RideStore  │
//! └─────────────┘     └─────────────┘     └─────────────┘
//!                            │
//!                            ▼
//!                     ┌─────────────┐     ┌─────────────┐
//!                     │ Dispatcher  │────▶│  EventBus   │◀─── LocationRelay
//!                     └─────────────┘     └─────────────┘
//!                                                │
//!                                                ▼
//!                                         user_N / ride_N
//! ```

pub mod bus;
pub mod channel;
pub mod directory;
pub mod dispatch;
pub mod error;
pub mod lifecycle;
pub mod message;
pub mod presence;
pub mod relay;
pub mod ride;
pub mod store;

pub use bus::{BusConfig, BusError, BusStats, EventBus, EventPublisher};
pub use channel::{Channel, ChannelKey, ChannelKind, Subscription};
pub use directory::{InMemoryDirectory, Profile, UserDirectory};
pub use dispatch::{events, NotificationDispatcher, Transition};
pub use error::RideError;
pub use lifecycle::RideLifecycle;
pub use message::{ConnectionId, Event};
pub use presence::{ConnectionPresence, PresenceRegistry};
pub use relay::LocationRelay;
pub use ride::{
    NewRide, NewRideRequest, Place, PlaceInput, Ride, RideId, RidePreferences, RideStatus,
    RideUpdate, ServiceArea, UserId,
};
pub use store::{InMemoryRideStore, RideStore, StoreError};
