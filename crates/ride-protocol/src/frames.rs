//! Frame types for the Ridecast realtime protocol.
//!
//! A frame is one message on a client connection. Inbound frames let a
//! client join its user channel, follow a ride, and stream driver positions;
//! outbound frames carry channel events and request acknowledgments.

use serde::{Deserialize, Serialize};

/// Current protocol version, announced in the `connected` frame.
pub const PROTOCOL_VERSION: u8 = 1;

/// Frame type identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
#[repr(u8)]
pub enum FrameType {
    Register = 0x01,
    SubscribeToRide = 0x02,
    UnsubscribeFromRide = 0x03,
    DriverLocationUpdate = 0x04,
    Event = 0x05,
    Ack = 0x06,
    Error = 0x07,
    Ping = 0x08,
    Pong = 0x09,
    Connected = 0x0A,
}

impl From<FrameType> for u8 {
    fn from(ft: FrameType) -> u8 {
        ft as u8
    }
}

impl TryFrom<u8> for FrameType {
    type Error = &'static str;

    fn try_from(value: u8) -> Result<Self, <Self as TryFrom<u8>>::Error> {
        match value {
            0x01 => Ok(FrameType::Register),
            0x02 => Ok(FrameType::SubscribeToRide),
            0x03 => Ok(FrameType::UnsubscribeFromRide),
            0x04 => Ok(FrameType::DriverLocationUpdate),
            0x05 => Ok(FrameType::Event),
            0x06 => Ok(FrameType::Ack),
            0x07 => Ok(FrameType::Error),
            0x08 => Ok(FrameType::Ping),
            0x09 => Ok(FrameType::Pong),
            0x0A => Ok(FrameType::Connected),
            _ => Err("Invalid frame type"),
        }
    }
}

/// Error codes carried by [`Frame::Error`].
pub mod error_codes {
    /// The frame could not be decoded.
    pub const MALFORMED: u16 = 1001;
    /// Joining a channel failed.
    pub const SUBSCRIBE_FAILED: u16 = 1002;
    /// Leaving a channel failed.
    pub const UNSUBSCRIBE_FAILED: u16 = 1008;
}

/// A protocol frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Frame {
    /// Join the sender's connection to its user channel.
    #[serde(rename = "register")]
    Register {
        /// Optional request ID for acknowledgment.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        id: Option<u64>,
        /// Account to receive notifications for.
        #[serde(rename = "userId")]
        user_id: i64,
    },

    /// Join the sender's connection to a ride channel.
    #[serde(rename = "subscribeToRide")]
    SubscribeToRide {
        /// Optional request ID for acknowledgment.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        id: Option<u64>,
        /// Ride to follow.
        #[serde(rename = "rideId")]
        ride_id: i64,
    },

    /// Leave a ride channel.
    #[serde(rename = "unsubscribeFromRide")]
    UnsubscribeFromRide {
        /// Optional request ID for acknowledgment.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        id: Option<u64>,
        /// Ride to stop following.
        #[serde(rename = "rideId")]
        ride_id: i64,
    },

    /// A driver position sample.
    ///
    /// Both fields are optional on the wire so that incomplete samples decode
    /// and can be dropped by the relay instead of failing the connection.
    #[serde(rename = "driverLocationUpdate")]
    DriverLocationUpdate {
        /// Ride the sample belongs to.
        #[serde(rename = "rideId", default, skip_serializing_if = "Option::is_none")]
        ride_id: Option<i64>,
        /// Opaque position object, relayed untouched.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        location: Option<serde_json::Value>,
    },

    /// A named event delivered on a channel.
    #[serde(rename = "event")]
    Event {
        /// Channel name (`user_<id>` or `ride_<id>`).
        channel: String,
        /// Event name, e.g. `ride.accepted`.
        event: String,
        /// Event payload.
        payload: serde_json::Value,
    },

    /// Acknowledgment of a request.
    #[serde(rename = "ack")]
    Ack {
        /// ID of the acknowledged request.
        id: u64,
    },

    /// Error response.
    #[serde(rename = "error")]
    Error {
        /// ID of the failed request (0 if not applicable).
        id: u64,
        /// Error code.
        code: u16,
        /// Human-readable error message.
        message: String,
    },

    /// Keepalive ping.
    #[serde(rename = "ping")]
    Ping {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        timestamp: Option<u64>,
    },

    /// Keepalive pong.
    #[serde(rename = "pong")]
    Pong {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        timestamp: Option<u64>,
    },

    /// Connection established response.
    #[serde(rename = "connected")]
    Connected {
        /// Unique connection identifier.
        #[serde(rename = "connectionId")]
        connection_id: String,
        /// Protocol version.
        version: u8,
        /// Recommended heartbeat interval in milliseconds.
        heartbeat: u32,
    },
}

impl Frame {
    /// Get the frame type.
    #[must_use]
    pub fn frame_type(&self) -> FrameType {
        match self {
            Frame::Register { .. } => FrameType::Register,
            Frame::SubscribeToRide { .. } => FrameType::SubscribeToRide,
            Frame::UnsubscribeFromRide { .. } => FrameType::UnsubscribeFromRide,
            Frame::DriverLocationUpdate { .. } => FrameType::DriverLocationUpdate,
            Frame::Event { .. } => FrameType::Event,
            Frame::Ack { .. } => FrameType::Ack,
            Frame::Error { .. } => FrameType::Error,
            Frame::Ping { .. } => FrameType::Ping,
            Frame::Pong { .. } => FrameType::Pong,
            Frame::Connected { .. } => FrameType::Connected,
        }
    }

    /// Create a Register frame without acknowledgment.
    #[must_use]
    pub fn register(user_id: i64) -> Self {
        Frame::Register { id: None, user_id }
    }

    /// Create a SubscribeToRide frame without acknowledgment.
    #[must_use]
    pub fn subscribe_to_ride(ride_id: i64) -> Self {
        Frame::SubscribeToRide { id: None, ride_id }
    }

    /// Create a driver location sample.
    #[must_use]
    pub fn driver_location(ride_id: i64, location: serde_json::Value) -> Self {
        Frame::DriverLocationUpdate {
            ride_id: Some(ride_id),
            location: Some(location),
        }
    }

    /// Create an Event frame.
    #[must_use]
    pub fn event(
        channel: impl Into<String>,
        event: impl Into<String>,
        payload: serde_json::Value,
    ) -> Self {
        Frame::Event {
            channel: channel.into(),
            event: event.into(),
            payload,
        }
    }

    /// Create a new Ack frame.
    #[must_use]
    pub fn ack(id: u64) -> Self {
        Frame::Ack { id }
    }

    /// Create a new Error frame.
    #[must_use]
    pub fn error(id: u64, code: u16, message: impl Into<String>) -> Self {
        Frame::Error {
            id,
            code,
            message: message.into(),
        }
    }

    /// Create a new Pong frame.
    #[must_use]
    pub fn pong(timestamp: Option<u64>) -> Self {
        Frame::Pong { timestamp }
    }

    /// Create a new Connected frame.
    #[must_use]
    pub fn connected(connection_id: impl Into<String>, heartbeat: u32) -> Self {
        Frame::Connected {
            connection_id: connection_id.into(),
            version: PROTOCOL_VERSION,
            heartbeat,
        }
    }
}
