//! # ridecast-protocol
//!
//! Wire protocol for the Ridecast realtime channel.
//!
//! Clients open one connection per session and use it to:
//!
//! - `register` - join their user channel for ride notifications
//! - `subscribeToRide` / `unsubscribeFromRide` - follow a ride's live location
//! - `driverLocationUpdate` - stream a driver's position to a ride
//!
//! The server answers with `event` frames (`ride.accepted`,
//! `ride.rejectedByDriver`, `ride.cancelledByPassenger`,
//! `driverLocationUpdate`) plus `ack` / `error` replies.
//!
//! ## Example
//!
//! ```rust
//! use ridecast_protocol::{codec, Frame};
//!
//! let frame = Frame::subscribe_to_ride(7);
//!
//! let encoded = codec::encode(&frame).unwrap();
//! let decoded = codec::decode(&encoded).unwrap();
//! assert_eq!(frame, decoded);
//! ```

pub mod codec;
pub mod frames;

pub use codec::{decode, encode, ProtocolError, WireFormat};
pub use frames::{error_codes, Frame, FrameType, PROTOCOL_VERSION};
