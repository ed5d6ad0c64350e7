//! Ride persistence.
//!
//! [`RideStore`] is the boundary the lifecycle writes through. Every status
//! change goes through [`RideStore::conditional_update_status`], which must
//! apply the update atomically and only when the stored status still equals
//! the expected one. This is what stops two drivers from both accepting the
//! same pending ride.

use crate::ride::{NewRide, Ride, RideId, RideStatus, RideUpdate, UserId};
use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use thiserror::Error;
use tracing::{debug, trace};

/// Store errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backend could not be reached.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// The backend rejected or failed the operation.
    #[error("store operation failed: {0}")]
    Backend(String),
}

/// Persistence for rides.
#[async_trait]
pub trait RideStore: Send + Sync {
    /// Persist a new pending ride and return it with its id.
    async fn create_ride(&self, ride: NewRide) -> Result<Ride, StoreError>;

    /// Look a ride up by id.
    async fn find_ride(&self, id: RideId) -> Result<Option<Ride>, StoreError>;

    /// Apply `update` only if the ride's status is `expected`.
    ///
    /// Returns the updated ride, or `None` if the ride is missing or its
    /// status did not match. Check and write must be one atomic step.
    async fn conditional_update_status(
        &self,
        id: RideId,
        expected: RideStatus,
        update: RideUpdate,
    ) -> Result<Option<Ride>, StoreError>;

    /// All rides of a passenger, newest first.
    async fn list_by_passenger(&self, passenger_id: UserId) -> Result<Vec<Ride>, StoreError>;

    /// Pending rides offered to a driver, newest first.
    async fn list_pending_for_driver(&self, driver_id: UserId) -> Result<Vec<Ride>, StoreError>;
}

/// In-process ride store.
#[derive(Debug)]
pub struct InMemoryRideStore {
    rides: DashMap<RideId, Ride>,
    next_id: AtomicI64,
}

impl InMemoryRideStore {
    /// Create an empty store whose first ride gets id 1.
    #[must_use]
    pub fn new() -> Self {
        Self::starting_at(1)
    }

    /// Create an empty store whose first ride gets `first_id`.
    #[must_use]
    pub fn starting_at(first_id: RideId) -> Self {
        Self {
            rides: DashMap::new(),
            next_id: AtomicI64::new(first_id),
        }
    }

    /// Number of stored rides.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rides.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rides.is_empty()
    }

    fn sorted_newest_first(mut rides: Vec<Ride>) -> Vec<Ride> {
        rides.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        rides
    }
}

impl Default for InMemoryRideStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RideStore for InMemoryRideStore {
    async fn create_ride(&self, ride: NewRide) -> Result<Ride, StoreError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let ride = ride.into_ride(id, Utc::now());
        self.rides.insert(id, ride.clone());
        debug!(ride = id, passenger = ride.passenger_id, "Ride stored");
        Ok(ride)
    }

    async fn find_ride(&self, id: RideId) -> Result<Option<Ride>, StoreError> {
        Ok(self.rides.get(&id).map(|r| r.clone()))
    }

    async fn conditional_update_status(
        &self,
        id: RideId,
        expected: RideStatus,
        update: RideUpdate,
    ) -> Result<Option<Ride>, StoreError> {
        // The shard write lock is held from the status check to the write.
        let Some(mut ride) = self.rides.get_mut(&id) else {
            return Ok(None);
        };
        if ride.status != expected {
            trace!(
                ride = id,
                expected = %expected,
                actual = %ride.status,
                "Conditional update missed"
            );
            return Ok(None);
        }
        update.apply_to(&mut ride, Utc::now());
        Ok(Some(ride.clone()))
    }

    async fn list_by_passenger(&self, passenger_id: UserId) -> Result<Vec<Ride>, StoreError> {
        let rides = self
            .rides
            .iter()
            .filter(|r| r.passenger_id == passenger_id)
            .map(|r| r.clone())
            .collect();
        Ok(Self::sorted_newest_first(rides))
    }

    async fn list_pending_for_driver(&self, _driver_id: UserId) -> Result<Vec<Ride>, StoreError> {
        // Every pending ride is offered to every driver.
        let rides = self
            .rides
            .iter()
            .filter(|r| r.status == RideStatus::Pending)
            .map(|r| r.clone())
            .collect();
        Ok(Self::sorted_newest_first(rides))
    }
}
