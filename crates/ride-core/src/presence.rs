//! Presence tracking for Ridecast.
//!
//! The registry records, for every live connection, which channels it has
//! joined and which account it registered as. Nothing here is persisted; a
//! reconnecting client starts from an empty membership set.

use crate::channel::ChannelKey;
use crate::message::ConnectionId;
use crate::ride::UserId;
use dashmap::DashMap;
use std::collections::HashSet;
use tracing::debug;

/// Presence state for a single connection.
#[derive(Debug, Clone)]
pub struct ConnectionPresence {
    pub connection_id: ConnectionId,
    /// Account the connection last registered as.
    pub user_id: Option<UserId>,
    /// Channels currently joined.
    pub channels: HashSet<ChannelKey>,
}

impl ConnectionPresence {
    fn new(connection_id: ConnectionId) -> Self {
        Self {
            connection_id,
            user_id: None,
            channels: HashSet::new(),
        }
    }
}

/// Channel membership per live connection.
#[derive(Debug, Default)]
pub struct PresenceRegistry {
    connections: DashMap<ConnectionId, ConnectionPresence>,
}

impl PresenceRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of connections holding at least one membership.
    #[must_use]
    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    /// Total memberships across all connections.
    #[must_use]
    pub fn membership_count(&self) -> usize {
        self.connections.iter().map(|c| c.channels.len()).sum()
    }

    /// Check whether a connection has joined a channel.
    #[must_use]
    pub fn is_member(&self, connection_id: &ConnectionId, key: &ChannelKey) -> bool {
        self.connections
            .get(connection_id)
            .is_some_and(|c| c.channels.contains(key))
    }

    /// Number of channels a connection has joined.
    #[must_use]
    pub fn channel_count(&self, connection_id: &ConnectionId) -> usize {
        self.connections
            .get(connection_id)
            .map_or(0, |c| c.channels.len())
    }

    /// Channels a connection has joined.
    #[must_use]
    pub fn channels(&self, connection_id: &ConnectionId) -> Vec<ChannelKey> {
        self.connections
            .get(connection_id)
            .map(|c| c.channels.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Record a membership.
    ///
    /// Joining a user channel also records the connection's account.
    /// Returns `true` if the membership is new.
    pub fn join(&self, connection_id: &ConnectionId, key: ChannelKey) -> bool {
        let mut presence = self
            .connections
            .entry(connection_id.clone())
            .or_insert_with(|| ConnectionPresence::new(connection_id.clone()));

        if let ChannelKey::User(user_id) = key {
            presence.user_id = Some(user_id);
        }

        let is_new = presence.channels.insert(key);
        if is_new {
            debug!(connection = %connection_id, channel = %key, "Presence: joined");
        }
        is_new
    }

    /// Remove a membership.
    ///
    /// Returns `true` if the connection was a member. A connection left with
    /// no memberships is forgotten.
    pub fn leave(&self, connection_id: &ConnectionId, key: &ChannelKey) -> bool {
        let removed = match self.connections.get_mut(connection_id) {
            Some(mut presence) => presence.channels.remove(key),
            None => return false,
        };
        self.connections
            .remove_if(connection_id, |_, p| p.channels.is_empty());

        if removed {
            debug!(connection = %connection_id, channel = %key, "Presence: left");
        }
        removed
    }

    /// Forget a connection entirely.
    ///
    /// Returns its presence state, if it had any memberships.
    pub fn remove(&self, connection_id: &ConnectionId) -> Option<ConnectionPresence> {
        let removed = self.connections.remove(connection_id).map(|(_, p)| p);
        if let Some(presence) = &removed {
            debug!(
                connection = %connection_id,
                channels = presence.channels.len(),
                "Presence: connection removed"
            );
        }
        removed
    }
}
