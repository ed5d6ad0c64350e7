//! Ride lifecycle.
//!
//! Every status change is a conditional update keyed on the status the
//! lifecycle just read. If another caller moved the ride in between, the
//! update misses and the caller gets [`RideError::InvalidTransition`] naming
//! the status the ride actually has now. Notifications go out only after the
//! store accepted the change.

use crate::bus::EventPublisher;
use crate::directory::UserDirectory;
use crate::dispatch::{NotificationDispatcher, Transition};
use crate::error::RideError;
use crate::ride::{NewRideRequest, Ride, RideId, RideStatus, RideUpdate, ServiceArea, UserId};
use crate::store::RideStore;
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Ride state machine over a [`RideStore`].
pub struct RideLifecycle {
    store: Arc<dyn RideStore>,
    directory: Arc<dyn UserDirectory>,
    dispatcher: NotificationDispatcher,
    service_area: Option<ServiceArea>,
}

impl RideLifecycle {
    /// Create a lifecycle that notifies through `publisher`.
    #[must_use]
    pub fn new(
        store: Arc<dyn RideStore>,
        directory: Arc<dyn UserDirectory>,
        publisher: Arc<dyn EventPublisher>,
    ) -> Self {
        let dispatcher = NotificationDispatcher::new(publisher, Arc::clone(&directory));
        Self {
            store,
            directory,
            dispatcher,
            service_area: None,
        }
    }

    /// Reject rides starting or ending outside `area`.
    #[must_use]
    pub fn with_service_area(mut self, area: ServiceArea) -> Self {
        self.service_area = Some(area);
        self
    }

    /// Create a pending ride.
    ///
    /// # Errors
    ///
    /// [`RideError::Validation`] for an incomplete or out-of-area request,
    /// [`RideError::NotFound`] for an unknown passenger.
    pub async fn create(&self, request: NewRideRequest) -> Result<Ride, RideError> {
        let new_ride = request.validate(self.service_area.as_ref())?;
        self.require_passenger(new_ride.passenger_id).await?;

        let ride = self.store.create_ride(new_ride).await?;
        info!(ride = ride.id, passenger = ride.passenger_id, "Ride requested");
        Ok(ride)
    }

    /// Look a ride up.
    ///
    /// # Errors
    ///
    /// [`RideError::NotFound`] if no ride has this id.
    pub async fn get(&self, ride_id: RideId) -> Result<Ride, RideError> {
        self.store
            .find_ride(ride_id)
            .await?
            .ok_or_else(|| ride_not_found(ride_id))
    }

    /// All rides of a passenger, newest first.
    ///
    /// # Errors
    ///
    /// [`RideError::NotFound`] for an unknown passenger.
    pub async fn passenger_rides(&self, passenger_id: UserId) -> Result<Vec<Ride>, RideError> {
        self.require_passenger(passenger_id).await?;
        Ok(self.store.list_by_passenger(passenger_id).await?)
    }

    /// Pending rides a driver can answer, newest first.
    ///
    /// # Errors
    ///
    /// [`RideError::NotFound`] for an unknown driver.
    pub async fn pending_requests(&self, driver_id: UserId) -> Result<Vec<Ride>, RideError> {
        self.require_driver(driver_id).await?;
        Ok(self.store.list_pending_for_driver(driver_id).await?)
    }

    /// A driver takes a pending ride.
    ///
    /// Of several drivers accepting the same ride concurrently, exactly one
    /// succeeds.
    ///
    /// # Errors
    ///
    /// [`RideError::NotFound`] for an unknown ride or driver,
    /// [`RideError::InvalidTransition`] unless the ride is pending.
    pub async fn accept(&self, ride_id: RideId, driver_id: UserId) -> Result<Ride, RideError> {
        let ride = self.get(ride_id).await?;
        self.require_driver(driver_id).await?;

        let update = RideUpdate::to(RideStatus::Accepted).with_driver(driver_id);
        self.transition(ride, Transition::Accept, update).await
    }

    /// A driver declines a pending ride, closing it.
    ///
    /// # Errors
    ///
    /// [`RideError::NotFound`] for an unknown ride or driver,
    /// [`RideError::Forbidden`] if another driver holds the ride,
    /// [`RideError::InvalidTransition`] unless the ride is pending.
    pub async fn reject(&self, ride_id: RideId, driver_id: UserId) -> Result<Ride, RideError> {
        let ride = self.get(ride_id).await?;
        self.require_driver(driver_id).await?;

        if let Some(assigned) = ride.driver_id {
            if assigned != driver_id {
                return Err(RideError::Forbidden(format!(
                    "driver {driver_id} is not assigned to ride {ride_id}"
                )));
            }
        }

        let update = RideUpdate::to(RideStatus::CancelledByDriver).with_driver(driver_id);
        self.transition(ride, Transition::Reject, update).await
    }

    /// The assigned driver picks the passenger up.
    ///
    /// # Errors
    ///
    /// [`RideError::NotFound`] for an unknown ride,
    /// [`RideError::InvalidTransition`] unless the ride is accepted.
    pub async fn start(&self, ride_id: RideId) -> Result<Ride, RideError> {
        let ride = self.get(ride_id).await?;
        self.transition(ride, Transition::Start, RideUpdate::to(RideStatus::InProgress))
            .await
    }

    /// The ride reached its destination.
    ///
    /// # Errors
    ///
    /// [`RideError::NotFound`] for an unknown ride,
    /// [`RideError::InvalidTransition`] unless the ride is in progress.
    pub async fn complete(&self, ride_id: RideId) -> Result<Ride, RideError> {
        let ride = self.get(ride_id).await?;
        let update = RideUpdate::to(RideStatus::Completed).with_completed_at(Utc::now());
        self.transition(ride, Transition::Complete, update).await
    }

    /// The passenger calls the ride off.
    ///
    /// # Errors
    ///
    /// [`RideError::NotFound`] for an unknown ride,
    /// [`RideError::Forbidden`] if the ride belongs to someone else,
    /// [`RideError::InvalidTransition`] once the ride is terminal.
    pub async fn cancel(&self, ride_id: RideId, passenger_id: UserId) -> Result<Ride, RideError> {
        let ride = self.get(ride_id).await?;
        if ride.passenger_id != passenger_id {
            return Err(RideError::Forbidden(format!(
                "passenger {passenger_id} does not own ride {ride_id}"
            )));
        }
        self.transition(
            ride,
            Transition::Cancel,
            RideUpdate::to(RideStatus::CancelledByPassenger),
        )
        .await
    }

    async fn transition(
        &self,
        ride: Ride,
        transition: Transition,
        update: RideUpdate,
    ) -> Result<Ride, RideError> {
        let expected = ride.status;
        if !expected.can_transition_to(transition.target_status()) {
            debug!(
                ride = ride.id,
                action = transition.action(),
                status = %expected,
                "Transition not allowed"
            );
            return Err(invalid(ride.id, transition, expected));
        }

        let updated = match self
            .store
            .conditional_update_status(ride.id, expected, update)
            .await
        {
            Ok(Some(updated)) => updated,
            Ok(None) => {
                // Someone else moved the ride first.
                let current = self.get(ride.id).await?;
                debug!(
                    ride = ride.id,
                    action = transition.action(),
                    expected = %expected,
                    actual = %current.status,
                    "Lost transition race"
                );
                return Err(invalid(ride.id, transition, current.status));
            }
            Err(e) => {
                warn!(
                    ride = ride.id,
                    action = transition.action(),
                    error = %e,
                    "Store rejected transition"
                );
                return Err(e.into());
            }
        };

        info!(
            ride = updated.id,
            action = transition.action(),
            from = %expected,
            to = %updated.status,
            driver = ?updated.driver_id,
            "Ride status changed"
        );
        self.dispatcher.dispatch(transition, &updated).await;
        Ok(updated)
    }

    async fn require_passenger(&self, id: UserId) -> Result<(), RideError> {
        match self.directory.find_passenger(id).await? {
            Some(_) => Ok(()),
            None => Err(RideError::NotFound(format!("passenger {id} not found"))),
        }
    }

    async fn require_driver(&self, id: UserId) -> Result<(), RideError> {
        match self.directory.find_driver(id).await? {
            Some(_) => Ok(()),
            None => Err(RideError::NotFound(format!("driver {id} not found"))),
        }
    }
}

fn ride_not_found(id: RideId) -> RideError {
    RideError::NotFound(format!("ride {id} not found"))
}

fn invalid(ride_id: RideId, transition: Transition, status: RideStatus) -> RideError {
    RideError::InvalidTransition {
        ride_id,
        action: transition.action(),
        status,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::ChannelKey;
    use crate::directory::{InMemoryDirectory, Profile};
    use crate::dispatch::events;
    use crate::dispatch::testing::RecordingPublisher;
    use crate::ride::NewRide;
    use crate::store::{InMemoryRideStore, StoreError};
    use async_trait::async_trait;
    use serde_json::json;

    const PASSENGER: UserId = 1;
    const DRIVER_A: UserId = 5;
    const DRIVER_B: UserId = 6;

    struct Harness {
        lifecycle: Arc<RideLifecycle>,
        publisher: Arc<RecordingPublisher>,
    }

    fn directory() -> Arc<InMemoryDirectory> {
        let directory = InMemoryDirectory::new();
        directory.add_passenger(Profile::new(PASSENGER, "Lina", "Benali"));
        directory.add_passenger(Profile::new(2, "Yacine", "Amrani"));
        directory.add_driver(Profile::new(DRIVER_A, "Karim", "Saadi").with_phone("0555"));
        directory.add_driver(Profile::new(DRIVER_B, "Sofia", "Mansouri"));
        Arc::new(directory)
    }

    fn harness_with(store: Arc<dyn RideStore>) -> Harness {
        let publisher = Arc::new(RecordingPublisher::default());
        let lifecycle = RideLifecycle::new(store, directory(), publisher.clone());
        Harness {
            lifecycle: Arc::new(lifecycle),
            publisher,
        }
    }

    fn harness() -> Harness {
        harness_with(Arc::new(InMemoryRideStore::starting_at(10)))
    }

    fn request(passenger_id: UserId) -> NewRideRequest {
        serde_json::from_value(json!({
            "passengerId": passenger_id,
            "startLocation": {"lat": 36.75, "lng": 3.06, "address": "Place des Martyrs"},
            "endLocation": {"lat": 36.69, "lng": 3.21, "address": "Aéroport"},
            "departureTime": "2026-10-19T08:30:00Z"
        }))
        .unwrap()
    }

    async fn accepted_ride(h: &Harness, driver: UserId) -> Ride {
        let ride = h.lifecycle.create(request(PASSENGER)).await.unwrap();
        h.lifecycle.accept(ride.id, driver).await.unwrap()
    }

    #[tokio::test]
    async fn test_create_ride() {
        let h = harness();
        let ride = h.lifecycle.create(request(PASSENGER)).await.unwrap();

        assert_eq!(ride.id, 10);
        assert_eq!(ride.status, RideStatus::Pending);
        assert!(ride.driver_id.is_none());
        assert!(ride.completed_at.is_none());
        assert!(h.publisher.events().is_empty());
    }

    #[tokio::test]
    async fn test_create_checks_passenger_and_area() {
        let h = harness();
        assert!(matches!(
            h.lifecycle.create(request(99)).await,
            Err(RideError::NotFound(_))
        ));

        let area = ServiceArea {
            min_lat: 40.0,
            max_lat: 50.0,
            min_lng: 0.0,
            max_lng: 10.0,
        };
        let lifecycle = RideLifecycle::new(
            Arc::new(InMemoryRideStore::new()),
            directory(),
            Arc::new(RecordingPublisher::default()),
        )
        .with_service_area(area);
        let err = lifecycle.create(request(PASSENGER)).await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "start and end locations are outside the service area"
        );
    }

    // Racing drivers: exactly one accept commits, the rest see ACCEPTED.
    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_accept_has_one_winner() {
        let h = harness();
        let ride = h.lifecycle.create(request(PASSENGER)).await.unwrap();
        assert_eq!(ride.id, 10);

        let a = {
            let lifecycle = Arc::clone(&h.lifecycle);
            tokio::spawn(async move { lifecycle.accept(10, DRIVER_A).await })
        };
        let b = {
            let lifecycle = Arc::clone(&h.lifecycle);
            tokio::spawn(async move { lifecycle.accept(10, DRIVER_B).await })
        };
        let results = [a.await.unwrap(), b.await.unwrap()];

        let winners: Vec<&Ride> = results.iter().filter_map(|r| r.as_ref().ok()).collect();
        assert_eq!(winners.len(), 1);
        let winner = winners[0].driver_id;

        let loser = results.iter().find_map(|r| r.as_ref().err()).unwrap();
        assert_eq!(loser.status_code(), 400);
        assert!(loser.to_string().ends_with("status ACCEPTED"));

        let stored = h.lifecycle.get(10).await.unwrap();
        assert_eq!(stored.status, RideStatus::Accepted);
        assert_eq!(stored.driver_id, winner);
        assert_eq!(h.publisher.events().len(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_many_concurrent_accepts() {
        let store = Arc::new(InMemoryRideStore::new());
        let directory = directory();
        for id in 100..132 {
            directory.add_driver(Profile::new(id, "Driver", id.to_string()));
        }
        let publisher = Arc::new(RecordingPublisher::default());
        let lifecycle = Arc::new(RideLifecycle::new(store, directory, publisher.clone()));
        let ride = lifecycle.create(request(PASSENGER)).await.unwrap();

        let handles: Vec<_> = (100..132)
            .map(|driver| {
                let lifecycle = Arc::clone(&lifecycle);
                let ride_id = ride.id;
                tokio::spawn(async move { lifecycle.accept(ride_id, driver).await })
            })
            .collect();

        let mut ok = Vec::new();
        let mut rejected = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(ride) => ok.push(ride),
                Err(RideError::InvalidTransition { status, .. }) => {
                    assert_eq!(status, RideStatus::Accepted);
                    rejected += 1;
                }
                Err(e) => panic!("unexpected error: {e}"),
            }
        }
        assert_eq!(ok.len(), 1);
        assert_eq!(rejected, 31);
        assert_eq!(
            lifecycle.get(ride.id).await.unwrap().driver_id,
            ok[0].driver_id
        );
        assert_eq!(publisher.events().len(), 1);
    }

    #[tokio::test]
    async fn test_accept_notifies_passenger() {
        let h = harness();
        let ride = accepted_ride(&h, DRIVER_A).await;

        assert_eq!(ride.status, RideStatus::Accepted);
        let events = h.publisher.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].channel, ChannelKey::User(PASSENGER));
        assert_eq!(events[0].name, events::RIDE_ACCEPTED);
        assert_eq!(events[0].payload["driver"]["name"], "Karim Saadi");
    }

    #[tokio::test]
    async fn test_accept_unknown_ride_or_driver() {
        let h = harness();
        assert!(matches!(
            h.lifecycle.accept(404, DRIVER_A).await,
            Err(RideError::NotFound(_))
        ));

        let ride = h.lifecycle.create(request(PASSENGER)).await.unwrap();
        assert!(matches!(
            h.lifecycle.accept(ride.id, 999).await,
            Err(RideError::NotFound(_))
        ));
    }

    // A finished ride cannot be started again.
    #[tokio::test]
    async fn test_start_complete_then_start_again() {
        let h = harness();
        let ride = accepted_ride(&h, DRIVER_A).await;

        let started = h.lifecycle.start(ride.id).await.unwrap();
        assert_eq!(started.status, RideStatus::InProgress);
        assert!(started.completed_at.is_none());

        let completed = h.lifecycle.complete(ride.id).await.unwrap();
        assert_eq!(completed.status, RideStatus::Completed);
        assert!(completed.completed_at.is_some());
        assert_eq!(completed.driver_id, Some(DRIVER_A));

        let err = h.lifecycle.start(ride.id).await.unwrap_err();
        assert_eq!(err.status_code(), 400);
        assert!(err.to_string().contains("COMPLETED"));

        // Only the acceptance was announced.
        assert_eq!(h.publisher.events().len(), 1);
    }

    #[tokio::test]
    async fn test_reject_closes_ride() {
        let h = harness();
        let ride = h.lifecycle.create(request(PASSENGER)).await.unwrap();

        let rejected = h.lifecycle.reject(ride.id, DRIVER_B).await.unwrap();
        assert_eq!(rejected.status, RideStatus::CancelledByDriver);
        assert_eq!(rejected.driver_id, Some(DRIVER_B));

        let events = h.publisher.events();
        assert_eq!(events[0].name, events::RIDE_REJECTED_BY_DRIVER);
        assert_eq!(events[0].channel, ChannelKey::User(PASSENGER));

        assert!(matches!(
            h.lifecycle.accept(ride.id, DRIVER_A).await,
            Err(RideError::InvalidTransition {
                status: RideStatus::CancelledByDriver,
                ..
            })
        ));
    }

    #[tokio::test]
    async fn test_reject_by_other_driver_is_forbidden() {
        let h = harness();
        let ride = accepted_ride(&h, DRIVER_A).await;

        assert!(matches!(
            h.lifecycle.reject(ride.id, DRIVER_B).await,
            Err(RideError::Forbidden(_))
        ));
        // The assigned driver can no longer reject an accepted ride.
        assert!(matches!(
            h.lifecycle.reject(ride.id, DRIVER_A).await,
            Err(RideError::InvalidTransition {
                status: RideStatus::Accepted,
                ..
            })
        ));
    }

    #[tokio::test]
    async fn test_cancel_notifies_assigned_driver() {
        let h = harness();
        let ride = accepted_ride(&h, DRIVER_A).await;

        let cancelled = h.lifecycle.cancel(ride.id, PASSENGER).await.unwrap();
        assert_eq!(cancelled.status, RideStatus::CancelledByPassenger);
        assert_eq!(cancelled.driver_id, Some(DRIVER_A));

        let events = h.publisher.events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[1].channel, ChannelKey::User(DRIVER_A));
        assert_eq!(events[1].name, events::RIDE_CANCELLED_BY_PASSENGER);
        assert_eq!(events[1].payload["passenger"]["name"], "Lina Benali");
    }

    #[tokio::test]
    async fn test_cancel_pending_ride_notifies_nobody() {
        let h = harness();
        let ride = h.lifecycle.create(request(PASSENGER)).await.unwrap();

        let cancelled = h.lifecycle.cancel(ride.id, PASSENGER).await.unwrap();
        assert_eq!(cancelled.status, RideStatus::CancelledByPassenger);
        assert!(cancelled.driver_id.is_none());
        assert!(h.publisher.events().is_empty());
    }

    #[tokio::test]
    async fn test_cancel_by_other_passenger_is_forbidden() {
        let h = harness();
        let ride = h.lifecycle.create(request(PASSENGER)).await.unwrap();

        assert!(matches!(
            h.lifecycle.cancel(ride.id, 2).await,
            Err(RideError::Forbidden(_))
        ));
        assert_eq!(
            h.lifecycle.get(ride.id).await.unwrap().status,
            RideStatus::Pending
        );
    }

    // Cancelling after completion is refused and the ride stays COMPLETED.
    #[tokio::test]
    async fn test_cancel_completed_ride() {
        let h = harness_with(Arc::new(InMemoryRideStore::starting_at(12)));
        let ride = accepted_ride(&h, DRIVER_A).await;
        assert_eq!(ride.id, 12);
        h.lifecycle.start(12).await.unwrap();
        h.lifecycle.complete(12).await.unwrap();
        let published = h.publisher.events().len();

        let err = h.lifecycle.cancel(12, PASSENGER).await.unwrap_err();
        assert_eq!(err.status_code(), 400);
        assert!(err.to_string().contains("COMPLETED"));
        assert_eq!(
            h.lifecycle.get(12).await.unwrap().status,
            RideStatus::Completed
        );
        assert_eq!(h.publisher.events().len(), published);
    }

    #[tokio::test]
    async fn test_status_walks_follow_graph() {
        let h = harness();
        let mut observed = Vec::new();

        let ride = h.lifecycle.create(request(PASSENGER)).await.unwrap();
        observed.push(ride.status);
        observed.push(h.lifecycle.accept(ride.id, DRIVER_A).await.unwrap().status);
        observed.push(h.lifecycle.start(ride.id).await.unwrap().status);
        observed.push(h.lifecycle.cancel(ride.id, PASSENGER).await.unwrap().status);

        for pair in observed.windows(2) {
            assert!(pair[0].can_transition_to(pair[1]), "{} -> {}", pair[0], pair[1]);
        }

        // Terminal rides never move again.
        assert!(h.lifecycle.start(ride.id).await.is_err());
        assert!(h.lifecycle.complete(ride.id).await.is_err());
        assert!(h.lifecycle.cancel(ride.id, PASSENGER).await.is_err());
        let stored = h.lifecycle.get(ride.id).await.unwrap();
        assert_eq!(stored.status, RideStatus::CancelledByPassenger);
        assert!(stored.completed_at.is_none());
    }

    #[tokio::test]
    async fn test_listings() {
        let h = harness();
        let first = h.lifecycle.create(request(PASSENGER)).await.unwrap();
        let second = h.lifecycle.create(request(PASSENGER)).await.unwrap();
        h.lifecycle.create(request(2)).await.unwrap();
        h.lifecycle.accept(first.id, DRIVER_A).await.unwrap();

        let mine = h.lifecycle.passenger_rides(PASSENGER).await.unwrap();
        assert_eq!(
            mine.iter().map(|r| r.id).collect::<Vec<_>>(),
            vec![second.id, first.id]
        );

        let pending = h.lifecycle.pending_requests(DRIVER_B).await.unwrap();
        assert_eq!(pending.len(), 2);
        assert!(pending.iter().all(|r| r.status == RideStatus::Pending));

        assert!(matches!(
            h.lifecycle.pending_requests(PASSENGER).await,
            Err(RideError::NotFound(_))
        ));
        assert!(matches!(
            h.lifecycle.passenger_rides(DRIVER_A).await,
            Err(RideError::NotFound(_))
        ));
    }

    /// Reads work, writes fail.
    struct ReadOnlyStore(InMemoryRideStore);

    #[async_trait]
    impl RideStore for ReadOnlyStore {
        async fn create_ride(&self, ride: NewRide) -> Result<Ride, StoreError> {
            self.0.create_ride(ride).await
        }

        async fn find_ride(&self, id: RideId) -> Result<Option<Ride>, StoreError> {
            self.0.find_ride(id).await
        }

        async fn conditional_update_status(
            &self,
            _id: RideId,
            _expected: RideStatus,
            _update: RideUpdate,
        ) -> Result<Option<Ride>, StoreError> {
            Err(StoreError::Unavailable("connection refused".into()))
        }

        async fn list_by_passenger(&self, passenger_id: UserId) -> Result<Vec<Ride>, StoreError> {
            self.0.list_by_passenger(passenger_id).await
        }

        async fn list_pending_for_driver(
            &self,
            driver_id: UserId,
        ) -> Result<Vec<Ride>, StoreError> {
            self.0.list_pending_for_driver(driver_id).await
        }
    }

    #[tokio::test]
    async fn test_storage_failure_publishes_nothing() {
        let h = harness_with(Arc::new(ReadOnlyStore(InMemoryRideStore::new())));
        let ride = h.lifecycle.create(request(PASSENGER)).await.unwrap();

        let err = h.lifecycle.accept(ride.id, DRIVER_A).await.unwrap_err();
        assert!(matches!(err, RideError::Storage(_)));
        assert_eq!(err.status_code(), 500);
        assert!(h.publisher.events().is_empty());
        assert_eq!(
            h.lifecycle.get(ride.id).await.unwrap().status,
            RideStatus::Pending
        );
    }

    #[tokio::test]
    async fn test_delivery_to_bus_subscribers() {
        use crate::bus::EventBus;
        use crate::message::ConnectionId;

        let bus = Arc::new(EventBus::new());
        let lifecycle = RideLifecycle::new(
            Arc::new(InMemoryRideStore::new()),
            directory(),
            bus.clone(),
        );
        let mut passenger = bus
            .register(PASSENGER, &ConnectionId::new("passenger-phone"))
            .unwrap();

        let ride = lifecycle.create(request(PASSENGER)).await.unwrap();
        lifecycle.accept(ride.id, DRIVER_A).await.unwrap();

        let event = passenger.recv().await.unwrap();
        assert_eq!(event.name, events::RIDE_ACCEPTED);
        assert_eq!(event.payload["rideId"], ride.id);
        assert_eq!(event.payload["status"], "ACCEPTED");
    }
}
