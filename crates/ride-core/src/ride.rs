//! Ride data model.

use crate::error::RideError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Ride identifier.
pub type RideId = i64;

/// Account identifier, shared by passengers and drivers.
pub type UserId = i64;

/// Status of a ride.
///
/// ```text
/// PENDING     -> ACCEPTED | CANCELLED_BY_DRIVER | CANCELLED_BY_PASSENGER
/// ACCEPTED    -> IN_PROGRESS | CANCELLED_BY_PASSENGER
/// IN_PROGRESS -> COMPLETED | CANCELLED_BY_PASSENGER
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RideStatus {
    Pending,
    Accepted,
    InProgress,
    Completed,
    CancelledByDriver,
    CancelledByPassenger,
}

impl RideStatus {
    /// Whether `next` is directly reachable from this status.
    #[must_use]
    pub fn can_transition_to(self, next: RideStatus) -> bool {
        use RideStatus::*;
        matches!(
            (self, next),
            (Pending, Accepted)
                | (Pending, CancelledByDriver)
                | (Pending, CancelledByPassenger)
                | (Accepted, InProgress)
                | (Accepted, CancelledByPassenger)
                | (InProgress, Completed)
                | (InProgress, CancelledByPassenger)
        )
    }

    /// Terminal statuses have no outgoing transition.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            RideStatus::Completed | RideStatus::CancelledByDriver | RideStatus::CancelledByPassenger
        )
    }

    /// Accepted or in progress: a driver is on the ride.
    #[must_use]
    pub fn is_active(self) -> bool {
        matches!(self, RideStatus::Accepted | RideStatus::InProgress)
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            RideStatus::Pending => "PENDING",
            RideStatus::Accepted => "ACCEPTED",
            RideStatus::InProgress => "IN_PROGRESS",
            RideStatus::Completed => "COMPLETED",
            RideStatus::CancelledByDriver => "CANCELLED_BY_DRIVER",
            RideStatus::CancelledByPassenger => "CANCELLED_BY_PASSENGER",
        }
    }
}

impl fmt::Display for RideStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named point on the map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Place {
    pub lat: f64,
    pub lng: f64,
    pub address: String,
}

/// Passenger comfort preferences attached to a request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RidePreferences {
    pub no_smoking: bool,
    pub no_pets: bool,
    pub quiet: bool,
}

/// A trip request and its progress.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ride {
    pub id: RideId,
    pub passenger_id: UserId,
    /// Unset while the ride is pending.
    pub driver_id: Option<UserId>,
    pub status: RideStatus,
    pub start_location: Place,
    pub end_location: Place,
    pub requested_departure_time: DateTime<Utc>,
    #[serde(default)]
    pub preferences: RidePreferences,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Set exactly when the ride is completed.
    pub completed_at: Option<DateTime<Utc>>,
}

/// A validated ride, ready to be stored.
#[derive(Debug, Clone, PartialEq)]
pub struct NewRide {
    pub passenger_id: UserId,
    pub start_location: Place,
    pub end_location: Place,
    pub requested_departure_time: DateTime<Utc>,
    pub preferences: RidePreferences,
}

impl NewRide {
    /// Build the pending ride a store persists under `id`.
    #[must_use]
    pub fn into_ride(self, id: RideId, now: DateTime<Utc>) -> Ride {
        Ride {
            id,
            passenger_id: self.passenger_id,
            driver_id: None,
            status: RideStatus::Pending,
            start_location: self.start_location,
            end_location: self.end_location,
            requested_departure_time: self.requested_departure_time,
            preferences: self.preferences,
            created_at: now,
            updated_at: now,
            completed_at: None,
        }
    }
}

/// Fields written by a status transition.
#[derive(Debug, Clone, PartialEq)]
pub struct RideUpdate {
    pub status: RideStatus,
    pub driver_id: Option<UserId>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl RideUpdate {
    /// Move to `status`, leaving the other fields untouched.
    #[must_use]
    pub fn to(status: RideStatus) -> Self {
        Self {
            status,
            driver_id: None,
            completed_at: None,
        }
    }

    /// Also assign a driver.
    #[must_use]
    pub fn with_driver(mut self, driver_id: UserId) -> Self {
        self.driver_id = Some(driver_id);
        self
    }

    /// Also stamp the completion time.
    #[must_use]
    pub fn with_completed_at(mut self, at: DateTime<Utc>) -> Self {
        self.completed_at = Some(at);
        self
    }

    /// Write the update into a stored ride.
    pub fn apply_to(&self, ride: &mut Ride, now: DateTime<Utc>) {
        ride.status = self.status;
        if let Some(driver_id) = self.driver_id {
            ride.driver_id = Some(driver_id);
        }
        if self.completed_at.is_some() {
            ride.completed_at = self.completed_at;
        }
        ride.updated_at = now;
    }
}

/// Bounding box rides must start and end in.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ServiceArea {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lng: f64,
    pub max_lng: f64,
}

impl ServiceArea {
    #[must_use]
    pub fn contains(&self, lat: f64, lng: f64) -> bool {
        (self.min_lat..=self.max_lat).contains(&lat)
            && (self.min_lng..=self.max_lng).contains(&lng)
    }
}

/// A place as submitted by a client; any field may be missing.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PlaceInput {
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub address: Option<String>,
}

/// An unvalidated request to create a ride.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewRideRequest {
    pub passenger_id: Option<UserId>,
    pub start_location: Option<PlaceInput>,
    pub end_location: Option<PlaceInput>,
    pub departure_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub preferences: RidePreferences,
}

impl NewRideRequest {
    /// Check required fields and coordinates.
    ///
    /// # Errors
    ///
    /// Returns [`RideError::Validation`] naming every missing field, or the
    /// endpoint that lies outside valid coordinates or the service area.
    pub fn validate(self, area: Option<&ServiceArea>) -> Result<NewRide, RideError> {
        let mut missing = Vec::new();
        if self.passenger_id.is_none() {
            missing.push("passengerId".to_string());
        }
        check_place("startLocation", self.start_location.as_ref(), &mut missing);
        check_place("endLocation", self.end_location.as_ref(), &mut missing);
        if self.departure_time.is_none() {
            missing.push("departureTime".to_string());
        }
        if !missing.is_empty() {
            return Err(RideError::Validation(format!(
                "missing required fields: {}",
                missing.join(", ")
            )));
        }

        // All options were checked above.
        let (Some(passenger_id), Some(start), Some(end), Some(departure)) = (
            self.passenger_id,
            self.start_location.and_then(into_place),
            self.end_location.and_then(into_place),
            self.departure_time,
        ) else {
            return Err(RideError::Validation("incomplete ride request".into()));
        };

        for (label, place) in [("start", &start), ("end", &end)] {
            if !valid_coordinates(place.lat, place.lng) {
                return Err(RideError::Validation(format!(
                    "{label} location has invalid coordinates"
                )));
            }
        }

        if let Some(area) = area {
            let start_in = area.contains(start.lat, start.lng);
            let end_in = area.contains(end.lat, end.lng);
            let outside = match (start_in, end_in) {
                (true, true) => None,
                (false, false) => Some("start and end locations are"),
                (false, true) => Some("start location is"),
                (true, false) => Some("end location is"),
            };
            if let Some(which) = outside {
                return Err(RideError::Validation(format!(
                    "{which} outside the service area"
                )));
            }
        }

        Ok(NewRide {
            passenger_id,
            start_location: start,
            end_location: end,
            requested_departure_time: departure,
            preferences: self.preferences,
        })
    }
}

fn check_place(field: &str, place: Option<&PlaceInput>, missing: &mut Vec<String>) {
    let Some(place) = place else {
        missing.push(field.to_string());
        return;
    };
    if place.lat.is_none() {
        missing.push(format!("{field}.lat"));
    }
    if place.lng.is_none() {
        missing.push(format!("{field}.lng"));
    }
    if place.address.as_deref().map_or(true, |a| a.trim().is_empty()) {
        missing.push(format!("{field}.address"));
    }
}

fn into_place(input: PlaceInput) -> Option<Place> {
    Some(Place {
        lat: input.lat?,
        lng: input.lng?,
        address: input.address?.trim().to_string(),
    })
}

fn valid_coordinates(lat: f64, lng: f64) -> bool {
    lat.is_finite()
        && lng.is_finite()
        && (-90.0..=90.0).contains(&lat)
        && (-180.0..=180.0).contains(&lng)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request() -> NewRideRequest {
        serde_json::from_value(json!({
            "passengerId": 4,
            "startLocation": {"lat": 36.75, "lng": 3.06, "address": "Place des Martyrs"},
            "endLocation": {"lat": 36.69, "lng": 3.21, "address": "Aéroport Houari Boumediene"},
            "departureTime": "2026-10-19T08:30:00Z",
            "preferences": {"quiet": true}
        }))
        .unwrap()
    }

    #[test]
    fn test_transition_graph() {
        use RideStatus::*;
        assert!(Pending.can_transition_to(Accepted));
        assert!(Accepted.can_transition_to(InProgress));
        assert!(InProgress.can_transition_to(CancelledByPassenger));
        assert!(!Pending.can_transition_to(InProgress));
        assert!(!Accepted.can_transition_to(CancelledByDriver));

        let all = [
            Pending,
            Accepted,
            InProgress,
            Completed,
            CancelledByDriver,
            CancelledByPassenger,
        ];
        for from in all.iter().filter(|s| s.is_terminal()) {
            assert!(all.iter().all(|to| !from.can_transition_to(*to)));
            assert!(!from.is_active());
        }
        assert!(InProgress.is_active());
        assert!(!Pending.is_active());
    }

    #[test]
    fn test_status_wire_names() {
        assert_eq!(
            serde_json::to_value(RideStatus::CancelledByPassenger).unwrap(),
            json!("CANCELLED_BY_PASSENGER")
        );
        assert_eq!(RideStatus::InProgress.to_string(), "IN_PROGRESS");
    }

    #[test]
    fn test_validate_accepts_complete_request() {
        let ride = request().validate(None).unwrap();
        assert_eq!(ride.passenger_id, 4);
        assert!(ride.preferences.quiet);
        assert!(!ride.preferences.no_pets);
    }

    #[test]
    fn test_validate_lists_missing_fields() {
        let mut req = request();
        req.passenger_id = None;
        req.end_location = Some(PlaceInput {
            lat: Some(1.0),
            lng: None,
            address: Some("  ".into()),
        });

        let err = req.validate(None).unwrap_err();
        let msg = err.to_string();
        assert!(matches!(err, RideError::Validation(_)));
        assert!(msg.contains("passengerId"));
        assert!(msg.contains("endLocation.lng"));
        assert!(msg.contains("endLocation.address"));
        assert!(!msg.contains("startLocation"));
    }

    #[test]
    fn test_validate_rejects_bad_coordinates() {
        let mut req = request();
        if let Some(start) = req.start_location.as_mut() {
            start.lat = Some(123.0);
        }
        assert!(req
            .validate(None)
            .unwrap_err()
            .to_string()
            .contains("start location"));
    }

    #[test]
    fn test_validate_service_area() {
        let area = ServiceArea {
            min_lat: 18.96,
            max_lat: 37.09,
            min_lng: -8.67,
            max_lng: 11.98,
        };
        assert!(request().validate(Some(&area)).is_ok());

        let mut req = request();
        if let Some(end) = req.end_location.as_mut() {
            end.lat = Some(48.85);
            end.lng = Some(2.35);
        }
        let msg = req.validate(Some(&area)).unwrap_err().to_string();
        assert_eq!(msg, "end location is outside the service area");
    }

    #[test]
    fn test_update_apply() {
        let now = Utc::now();
        let mut ride = request().validate(None).unwrap().into_ride(1, now);
        assert_eq!(ride.status, RideStatus::Pending);
        assert!(ride.driver_id.is_none());

        RideUpdate::to(RideStatus::Accepted)
            .with_driver(9)
            .apply_to(&mut ride, now);
        assert_eq!(ride.driver_id, Some(9));
        assert!(ride.completed_at.is_none());

        RideUpdate::to(RideStatus::InProgress).apply_to(&mut ride, now);
        assert_eq!(ride.driver_id, Some(9));
    }
}
