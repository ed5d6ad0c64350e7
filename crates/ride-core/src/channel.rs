//! Channel abstraction for Ridecast.
//!
//! A channel is a broadcast group of live connections. There are two kinds:
//! user channels carry account-scoped ride notifications, ride channels carry
//! the high-frequency location stream of a single ride.

use crate::message::{ConnectionId, Event};
use crate::ride::{RideId, UserId};
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, trace};

/// Default broadcast channel capacity.
const DEFAULT_CHANNEL_CAPACITY: usize = 1024;

/// The kind of a channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelKind {
    User,
    Ride,
}

/// Identifies a channel.
///
/// The kind is part of the key, so `User(7)` and `Ride(7)` are different
/// channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelKey {
    /// Notifications for one account.
    User(UserId),
    /// Live tracking for one ride.
    Ride(RideId),
}

impl ChannelKey {
    /// Get the channel kind.
    #[must_use]
    pub fn kind(&self) -> ChannelKind {
        match self {
            ChannelKey::User(_) => ChannelKind::User,
            ChannelKey::Ride(_) => ChannelKind::Ride,
        }
    }

    /// Get the numeric id inside the key.
    #[must_use]
    pub fn id(&self) -> i64 {
        match self {
            ChannelKey::User(id) | ChannelKey::Ride(id) => *id,
        }
    }
}

impl fmt::Display for ChannelKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChannelKey::User(id) => write!(f, "user_{id}"),
            ChannelKey::Ride(id) => write!(f, "ride_{id}"),
        }
    }
}

/// A connection's handle on one channel.
///
/// Events published by the holder's own connection are skipped, and once the
/// connection leaves the channel the handle yields nothing more.
#[derive(Debug)]
pub struct Subscription {
    key: ChannelKey,
    connection_id: ConnectionId,
    receiver: broadcast::Receiver<Arc<Event>>,
    active: Arc<AtomicBool>,
}

impl Subscription {
    /// The channel this subscription belongs to.
    #[must_use]
    pub fn key(&self) -> ChannelKey {
        self.key
    }

    /// Whether the connection is still a member of the channel.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    /// Wait for the next event.
    ///
    /// Returns `None` once the connection left the channel or the channel was
    /// dropped. Events lost to a full buffer are skipped.
    pub async fn recv(&mut self) -> Option<Arc<Event>> {
        loop {
            if !self.is_active() {
                return None;
            }
            match self.receiver.recv().await {
                Ok(event) if event.is_from(&self.connection_id) => continue,
                Ok(event) => return self.is_active().then_some(event),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    debug!(
                        channel = %self.key,
                        connection = %self.connection_id,
                        skipped,
                        "Subscriber lagged"
                    );
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Take the next already-delivered event without waiting.
    pub fn try_recv(&mut self) -> Option<Arc<Event>> {
        loop {
            if !self.is_active() {
                return None;
            }
            match self.receiver.try_recv() {
                Ok(event) if event.is_from(&self.connection_id) => continue,
                Ok(event) => return Some(event),
                Err(broadcast::error::TryRecvError::Lagged(_)) => continue,
                Err(_) => return None,
            }
        }
    }
}

/// A channel for pub/sub messaging.
#[derive(Debug)]
pub struct Channel {
    key: ChannelKey,
    sender: broadcast::Sender<Arc<Event>>,
    /// Members and the liveness flag shared with their subscription.
    subscribers: HashMap<ConnectionId, Arc<AtomicBool>>,
}

impl Channel {
    /// Create a new channel.
    #[must_use]
    pub fn new(key: ChannelKey) -> Self {
        Self::with_capacity(key, DEFAULT_CHANNEL_CAPACITY)
    }

    /// Create a new channel with a specific capacity.
    #[must_use]
    pub fn with_capacity(key: ChannelKey, capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self {
            key,
            sender,
            subscribers: HashMap::new(),
        }
    }

    #[must_use]
    pub fn key(&self) -> ChannelKey {
        self.key
    }

    /// Get the number of subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    /// Check if a connection is subscribed.
    #[must_use]
    pub fn is_subscribed(&self, connection_id: &ConnectionId) -> bool {
        self.subscribers.contains_key(connection_id)
    }

    /// Subscribe a connection to this channel.
    ///
    /// Subscribing again replaces the previous subscription, which goes
    /// inactive.
    pub fn subscribe(&mut self, connection_id: ConnectionId) -> Subscription {
        let active = Arc::new(AtomicBool::new(true));
        if let Some(previous) = self
            .subscribers
            .insert(connection_id.clone(), Arc::clone(&active))
        {
            previous.store(false, Ordering::Release);
        }
        debug!(channel = %self.key, connection = %connection_id, "Connection subscribed");
        Subscription {
            key: self.key,
            connection_id,
            receiver: self.sender.subscribe(),
            active,
        }
    }

    /// Unsubscribe a connection from this channel.
    ///
    /// Returns `true` if the connection was subscribed.
    pub fn unsubscribe(&mut self, connection_id: &ConnectionId) -> bool {
        match self.subscribers.remove(connection_id) {
            Some(active) => {
                active.store(false, Ordering::Release);
                debug!(channel = %self.key, connection = %connection_id, "Connection unsubscribed");
                true
            }
            None => false,
        }
    }

    /// Publish an event to this channel.
    ///
    /// Returns the number of members the event is addressed to, which
    /// excludes the publishing connection.
    pub fn publish(&self, event: Event) -> usize {
        let recipients = match &event.source {
            Some(source) if self.subscribers.contains_key(source) => self.subscribers.len() - 1,
            _ => self.subscribers.len(),
        };
        trace!(channel = %self.key, event = %event.name, recipients, "Publishing event");
        if recipients == 0 {
            return 0;
        }
        // No receivers means every member already dropped its handle.
        match self.sender.send(Arc::new(event)) {
            Ok(_) => recipients,
            Err(_) => 0,
        }
    }

    /// Check if the channel is empty (no subscribers).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.subscribers.is_empty()
    }

    /// Mark every member inactive, ahead of dropping the channel.
    pub(crate) fn close(&mut self) {
        for (_, active) in self.subscribers.drain() {
            active.store(false, Ordering::Release);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn conn(id: &str) -> ConnectionId {
        ConnectionId::new(id)
    }

    #[test]
    fn test_channel_key_kinds_never_alias() {
        assert_ne!(ChannelKey::User(7), ChannelKey::Ride(7));
        assert_eq!(ChannelKey::User(7).to_string(), "user_7");
        assert_eq!(ChannelKey::Ride(7).to_string(), "ride_7");
        assert_eq!(ChannelKey::Ride(7).kind(), ChannelKind::Ride);
        assert_eq!(ChannelKey::User(7).id(), 7);
    }

    #[test]
    fn test_channel_subscribe_unsubscribe() {
        let mut channel = Channel::new(ChannelKey::Ride(1));

        let _rx = channel.subscribe(conn("conn-1"));
        let _rx2 = channel.subscribe(conn("conn-2"));
        assert_eq!(channel.subscriber_count(), 2);

        assert!(channel.unsubscribe(&conn("conn-1")));
        assert_eq!(channel.subscriber_count(), 1);
        assert!(!channel.is_subscribed(&conn("conn-1")));
        assert!(!channel.unsubscribe(&conn("conn-1")));
    }

    #[test]
    fn test_publish_skips_source() {
        let mut channel = Channel::new(ChannelKey::Ride(7));
        let mut driver = channel.subscribe(conn("driver"));
        let mut passenger = channel.subscribe(conn("passenger"));

        let event = Event::new(ChannelKey::Ride(7), "driverLocationUpdate", json!({"rideId": 7}))
            .with_source(conn("driver"));
        assert_eq!(channel.publish(event), 1);

        assert!(passenger.try_recv().is_some());
        assert!(driver.try_recv().is_none());
    }

    #[test]
    fn test_unsubscribed_handle_goes_quiet() {
        let mut channel = Channel::new(ChannelKey::User(3));
        let mut first = channel.subscribe(conn("conn-1"));
        let _second = channel.subscribe(conn("conn-2"));

        channel.unsubscribe(&conn("conn-1"));
        channel.publish(Event::new(ChannelKey::User(3), "ride.accepted", json!({})));

        assert!(!first.is_active());
        assert!(first.try_recv().is_none());
    }

    #[tokio::test]
    async fn test_channel_publish() {
        let mut channel = Channel::new(ChannelKey::User(5));
        let mut rx = channel.subscribe(conn("conn-1"));

        let count = channel.publish(Event::new(
            ChannelKey::User(5),
            "ride.accepted",
            json!({"rideId": 1}),
        ));
        assert_eq!(count, 1);

        let event = rx.recv().await.unwrap();
        assert_eq!(event.name, "ride.accepted");
        assert_eq!(event.payload["rideId"], 1);
    }
}
