//! Errors returned by ride operations.

use crate::ride::{RideId, RideStatus};
use crate::store::StoreError;
use thiserror::Error;

/// Ride lifecycle errors.
#[derive(Debug, Error)]
pub enum RideError {
    /// A required field is missing or malformed.
    #[error("{0}")]
    Validation(String),

    /// The ride or user does not exist.
    #[error("{0}")]
    NotFound(String),

    /// The ride's current status does not allow the requested transition.
    ///
    /// `status` is the status found at the time of failure, which may be
    /// newer than the caller's view of the ride.
    #[error("cannot {action} ride {ride_id} with status {status}")]
    InvalidTransition {
        ride_id: RideId,
        action: &'static str,
        status: RideStatus,
    },

    /// The actor is not the ride's passenger or assigned driver.
    #[error("{0}")]
    Forbidden(String),

    /// The store failed; nothing was committed.
    #[error("storage failure: {0}")]
    Storage(#[from] StoreError),
}

impl RideError {
    /// HTTP status code for this error.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self {
            RideError::Validation(_) | RideError::InvalidTransition { .. } => 400,
            RideError::Forbidden(_) => 403,
            RideError::NotFound(_) => 404,
            RideError::Storage(_) => 500,
        }
    }

    /// Short label for logs and metrics.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            RideError::Validation(_) => "validation",
            RideError::NotFound(_) => "not_found",
            RideError::InvalidTransition { .. } => "invalid_transition",
            RideError::Forbidden(_) => "forbidden",
            RideError::Storage(_) => "storage",
        }
    }
}
