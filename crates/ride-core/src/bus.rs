//! Event bus for Ridecast.
//!
//! The bus owns every live channel and the presence registry. Connections
//! join channels and get a [`Subscription`] back; publishers address events
//! to a [`ChannelKey`]. Delivery is best-effort: an event reaches the
//! connections joined at the moment of publishing and is never stored or
//! retried.

use crate::channel::{Channel, ChannelKey, Subscription};
use crate::message::{ConnectionId, Event};
use crate::presence::PresenceRegistry;
use crate::ride::{RideId, UserId};
use dashmap::DashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use thiserror::Error;
use tracing::{debug, info, trace};

/// Bus errors.
#[derive(Debug, Error)]
pub enum BusError {
    /// The bus is shut down and no longer delivers events.
    #[error("Event bus unavailable")]
    Unavailable,

    /// Not subscribed to channel.
    #[error("Not subscribed to channel: {0}")]
    NotSubscribed(ChannelKey),

    /// Already subscribed to channel.
    #[error("Already subscribed to channel: {0}")]
    AlreadySubscribed(ChannelKey),

    /// Maximum subscriptions reached.
    #[error("Maximum subscriptions reached")]
    MaxSubscriptionsReached,

    /// Maximum number of live channels reached.
    #[error("Maximum channels reached")]
    MaxChannelsReached,
}

/// Anything that can deliver an event to a channel.
///
/// The lifecycle's dispatcher and the location relay publish through this
/// trait so that tests can swap the bus for a recording or failing fake.
pub trait EventPublisher: Send + Sync {
    /// Publish an event to its channel.
    ///
    /// Returns the number of connections it was addressed to.
    ///
    /// # Errors
    ///
    /// Returns [`BusError::Unavailable`] if events cannot be delivered.
    fn publish(&self, event: Event) -> Result<usize, BusError>;
}

/// Bus configuration.
#[derive(Debug, Clone)]
pub struct BusConfig {
    /// Maximum number of live channels.
    pub max_channels: usize,
    /// Maximum channels one connection may join.
    pub max_subscriptions_per_connection: usize,
    /// Per-channel broadcast buffer.
    pub channel_capacity: usize,
    /// Whether to drop channels when their last member leaves.
    pub auto_delete_empty_channels: bool,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            max_channels: 100_000,
            max_subscriptions_per_connection: 100,
            channel_capacity: 1024,
            auto_delete_empty_channels: true,
        }
    }
}

/// The central event bus.
pub struct EventBus {
    channels: DashMap<ChannelKey, Channel>,
    presence: PresenceRegistry,
    config: BusConfig,
    closed: AtomicBool,
}

impl EventBus {
    /// Create a new bus with default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(BusConfig::default())
    }

    /// Create a new bus with custom configuration.
    #[must_use]
    pub fn with_config(config: BusConfig) -> Self {
        info!("Creating event bus with config: {:?}", config);
        Self {
            channels: DashMap::new(),
            presence: PresenceRegistry::new(),
            config,
            closed: AtomicBool::new(false),
        }
    }

    /// Get bus statistics.
    #[must_use]
    pub fn stats(&self) -> BusStats {
        BusStats {
            channel_count: self.channels.len(),
            connection_count: self.presence.connection_count(),
            total_subscriptions: self.presence.membership_count(),
        }
    }

    fn ensure_open(&self) -> Result<(), BusError> {
        if self.closed.load(Ordering::Acquire) {
            Err(BusError::Unavailable)
        } else {
            Ok(())
        }
    }

    /// Join a connection to a channel.
    ///
    /// # Errors
    ///
    /// Returns an error if the bus is shut down, the connection is already a
    /// member, or a limit is exceeded.
    pub fn join(
        &self,
        key: ChannelKey,
        connection_id: &ConnectionId,
    ) -> Result<Subscription, BusError> {
        self.ensure_open()?;

        if self.presence.is_member(connection_id, &key) {
            return Err(BusError::AlreadySubscribed(key));
        }
        if self.presence.channel_count(connection_id)
            >= self.config.max_subscriptions_per_connection
        {
            return Err(BusError::MaxSubscriptionsReached);
        }
        if !self.channels.contains_key(&key) && self.channels.len() >= self.config.max_channels {
            return Err(BusError::MaxChannelsReached);
        }

        let subscription = {
            let mut channel = self.channels.entry(key).or_insert_with(|| {
                debug!(channel = %key, "Creating new channel");
                Channel::with_capacity(key, self.config.channel_capacity)
            });
            channel.subscribe(connection_id.clone())
        };
        self.presence.join(connection_id, key);

        debug!(
            channel = %key,
            connection = %connection_id,
            subscribers = self.subscriber_count(&key),
            "Joined"
        );

        Ok(subscription)
    }

    /// Join a connection to a user's notification channel.
    ///
    /// # Errors
    ///
    /// See [`EventBus::join`].
    pub fn register(
        &self,
        user_id: UserId,
        connection_id: &ConnectionId,
    ) -> Result<Subscription, BusError> {
        self.join(ChannelKey::User(user_id), connection_id)
    }

    /// Join a connection to a ride's tracking channel.
    ///
    /// # Errors
    ///
    /// See [`EventBus::join`].
    pub fn subscribe_to_ride(
        &self,
        ride_id: RideId,
        connection_id: &ConnectionId,
    ) -> Result<Subscription, BusError> {
        self.join(ChannelKey::Ride(ride_id), connection_id)
    }

    /// Remove a connection from a channel.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection is not a member.
    pub fn leave(&self, key: ChannelKey, connection_id: &ConnectionId) -> Result<(), BusError> {
        if !self.presence.leave(connection_id, &key) {
            return Err(BusError::NotSubscribed(key));
        }
        self.detach(key, connection_id);
        debug!(channel = %key, connection = %connection_id, "Left");
        Ok(())
    }

    /// Drop every membership of a connection.
    ///
    /// Returns the channels it was removed from.
    pub fn disconnect(&self, connection_id: &ConnectionId) -> Vec<ChannelKey> {
        let Some(presence) = self.presence.remove(connection_id) else {
            return Vec::new();
        };
        let keys: Vec<ChannelKey> = presence.channels.into_iter().collect();
        for key in &keys {
            self.detach(*key, connection_id);
        }
        debug!(
            connection = %connection_id,
            user = ?presence.user_id,
            channels = keys.len(),
            "Disconnected from all channels"
        );
        keys
    }

    fn detach(&self, key: ChannelKey, connection_id: &ConnectionId) {
        if let Some(mut channel) = self.channels.get_mut(&key) {
            channel.unsubscribe(connection_id);
        }
        if self.config.auto_delete_empty_channels
            && self
                .channels
                .remove_if(&key, |_, channel| channel.is_empty())
                .is_some()
        {
            debug!(channel = %key, "Deleted empty channel");
        }
    }

    /// Stop delivering events and drop every channel.
    ///
    /// Outstanding subscriptions end; later joins and publishes fail with
    /// [`BusError::Unavailable`].
    pub fn shutdown(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        for mut channel in self.channels.iter_mut() {
            channel.close();
        }
        self.channels.clear();
        info!("Event bus shut down");
    }

    /// Check if a channel exists.
    #[must_use]
    pub fn channel_exists(&self, key: &ChannelKey) -> bool {
        self.channels.contains_key(key)
    }

    /// Get the subscriber count for a channel.
    #[must_use]
    pub fn subscriber_count(&self, key: &ChannelKey) -> usize {
        self.channels
            .get(key)
            .map(|c| c.subscriber_count())
            .unwrap_or(0)
    }

    /// Get the channels a connection has joined.
    #[must_use]
    pub fn connection_channels(&self, connection_id: &ConnectionId) -> Vec<ChannelKey> {
        self.presence.channels(connection_id)
    }
}

impl EventPublisher for EventBus {
    fn publish(&self, event: Event) -> Result<usize, BusError> {
        self.ensure_open()?;

        let key = event.channel;
        match self.channels.get(&key) {
            Some(channel) => {
                let count = channel.publish(event);
                trace!(channel = %key, recipients = count, "Published event");
                Ok(count)
            }
            None => {
                trace!(channel = %key, "Publish to channel with no members");
                Ok(0)
            }
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

/// Bus statistics.
#[derive(Debug, Clone)]
pub struct BusStats {
    /// Number of live channels.
    pub channel_count: usize,
    /// Number of connections holding a membership.
    pub connection_count: usize,
    /// Total number of memberships.
    pub total_subscriptions: usize,
}
