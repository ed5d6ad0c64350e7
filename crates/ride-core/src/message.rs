//! Event and connection identity types.

use crate::channel::ChannelKey;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// Atomic counter for ensuring unique IDs even within the same nanosecond.
static ID_COUNTER: AtomicU64 = AtomicU64::new(0);

fn now_nanos() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or_default()
}

/// Unique identifier for a live client connection.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(String);

impl ConnectionId {
    /// Create a connection ID from an existing string.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a fresh connection ID.
    #[must_use]
    pub fn generate() -> Self {
        let counter = ID_COUNTER.fetch_add(1, Ordering::Relaxed);
        Self(format!("conn_{:x}_{:x}", now_nanos(), counter))
    }

    /// Get the ID as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ConnectionId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// A named event addressed to one channel.
#[derive(Debug, Clone)]
pub struct Event {
    /// Connection that produced the event; it is not delivered back to it.
    pub source: Option<ConnectionId>,
    pub channel: ChannelKey,
    /// Event name, e.g. `ride.accepted`.
    pub name: String,
    pub payload: serde_json::Value,
}

impl Event {
    /// Create a new event.
    #[must_use]
    pub fn new(channel: ChannelKey, name: impl Into<String>, payload: serde_json::Value) -> Self {
        Self {
            source: None,
            channel,
            name: name.into(),
            payload,
        }
    }

    /// Mark the connection that produced this event.
    #[must_use]
    pub fn with_source(mut self, source: ConnectionId) -> Self {
        self.source = Some(source);
        self
    }

    /// Whether the event was produced by the given connection.
    #[must_use]
    pub fn is_from(&self, connection_id: &ConnectionId) -> bool {
        self.source.as_ref() == Some(connection_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_event_with_source() {
        let event = Event::new(ChannelKey::Ride(7), "driverLocationUpdate", json!({}))
            .with_source(ConnectionId::new("conn-123"));

        assert!(event.is_from(&ConnectionId::new("conn-123")));
        assert!(!event.is_from(&ConnectionId::new("conn-456")));
        assert_eq!(event.channel, ChannelKey::Ride(7));
    }

    #[test]
    fn test_unique_connection_ids() {
        let a = ConnectionId::generate();
        let b = ConnectionId::generate();
        assert_ne!(a, b);
        assert!(a.as_str().starts_with("conn_"));
    }
}
