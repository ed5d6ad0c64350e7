//! HTTP routes for the ride lifecycle.
//!
//! Every response body is either `{"success": true, "data": ...}` or
//! `{"success": false, "message": ...}`.

use crate::handlers::AppState;
use crate::metrics;
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use ridecast_core::{NewRideRequest, Ride, RideError, RideId, Transition, UserId};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error};

/// Errors returned by the HTTP layer.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Ride(#[from] RideError),

    #[error("invalid request body: {0}")]
    InvalidBody(String),

    #[error("invalid path: {0}")]
    InvalidPath(String),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Ride(e) => {
                StatusCode::from_u16(e.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
            }
            ApiError::InvalidBody(_) | ApiError::InvalidPath(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::InvalidBody(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::InvalidPath(rejection.body_text())
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    success: bool,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = if status.is_server_error() {
            error!(error = %self, "Request failed");
            "internal server error".to_string()
        } else {
            debug!(status = status.as_u16(), error = %self, "Request refused");
            self.to_string()
        };
        let body = ErrorBody {
            success: false,
            message,
        };
        (status, Json(body)).into_response()
    }
}

/// Successful response body.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
}

type ApiResult<T> = Result<Json<ApiResponse<T>>, ApiError>;

fn ok<T>(data: T) -> Json<ApiResponse<T>> {
    Json(ApiResponse {
        success: true,
        data,
    })
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DriverAction {
    driver_id: Option<UserId>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PassengerAction {
    passenger_id: Option<UserId>,
}

fn required(value: Option<UserId>, field: &str) -> Result<UserId, ApiError> {
    value.ok_or_else(|| RideError::Validation(format!("missing required fields: {field}")).into())
}

/// Ride routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/rides", post(create_ride))
        .route("/rides/:id", get(get_ride))
        .route("/rides/:id/accept", put(accept_ride))
        .route("/rides/:id/reject", put(reject_ride))
        .route("/rides/:id/start", put(start_ride))
        .route("/rides/:id/complete", put(complete_ride))
        .route("/rides/:id/cancel", put(cancel_ride))
        .route("/passengers/:id/rides", get(passenger_rides))
        .route("/drivers/:id/requests", get(driver_requests))
}

async fn create_ride(
    State(state): State<Arc<AppState>>,
    body: Result<Json<NewRideRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<Ride>>), ApiError> {
    let Json(request) = body?;
    let ride = state.lifecycle.create(request).await?;
    Ok((StatusCode::CREATED, ok(ride)))
}

async fn get_ride(
    State(state): State<Arc<AppState>>,
    id: Result<Path<RideId>, PathRejection>,
) -> ApiResult<Ride> {
    let Path(id) = id?;
    Ok(ok(state.lifecycle.get(id).await?))
}

async fn passenger_rides(
    State(state): State<Arc<AppState>>,
    id: Result<Path<UserId>, PathRejection>,
) -> ApiResult<Vec<Ride>> {
    let Path(id) = id?;
    Ok(ok(state.lifecycle.passenger_rides(id).await?))
}

async fn driver_requests(
    State(state): State<Arc<AppState>>,
    id: Result<Path<UserId>, PathRejection>,
) -> ApiResult<Vec<Ride>> {
    let Path(id) = id?;
    Ok(ok(state.lifecycle.pending_requests(id).await?))
}

/// Count the outcome of a transition and shape the response.
fn observed(transition: Transition, result: Result<Ride, RideError>) -> ApiResult<Ride> {
    match result {
        Ok(ride) => {
            metrics::record_transition(transition.action());
            Ok(ok(ride))
        }
        Err(e) => {
            metrics::record_transition_failure(transition.action(), e.kind());
            Err(e.into())
        }
    }
}

async fn accept_ride(
    State(state): State<Arc<AppState>>,
    id: Result<Path<RideId>, PathRejection>,
    body: Result<Json<DriverAction>, JsonRejection>,
) -> ApiResult<Ride> {
    let Path(id) = id?;
    let Json(action) = body?;
    let driver_id = required(action.driver_id, "driverId")?;
    observed(Transition::Accept, state.lifecycle.accept(id, driver_id).await)
}

async fn reject_ride(
    State(state): State<Arc<AppState>>,
    id: Result<Path<RideId>, PathRejection>,
    body: Result<Json<DriverAction>, JsonRejection>,
) -> ApiResult<Ride> {
    let Path(id) = id?;
    let Json(action) = body?;
    let driver_id = required(action.driver_id, "driverId")?;
    observed(Transition::Reject, state.lifecycle.reject(id, driver_id).await)
}

async fn start_ride(
    State(state): State<Arc<AppState>>,
    id: Result<Path<RideId>, PathRejection>,
) -> ApiResult<Ride> {
    let Path(id) = id?;
    observed(Transition::Start, state.lifecycle.start(id).await)
}

async fn complete_ride(
    State(state): State<Arc<AppState>>,
    id: Result<Path<RideId>, PathRejection>,
) -> ApiResult<Ride> {
    let Path(id) = id?;
    observed(Transition::Complete, state.lifecycle.complete(id).await)
}

async fn cancel_ride(
    State(state): State<Arc<AppState>>,
    id: Result<Path<RideId>, PathRejection>,
    body: Result<Json<PassengerAction>, JsonRejection>,
) -> ApiResult<Ride> {
    let Path(id) = id?;
    let Json(action) = body?;
    let passenger_id = required(action.passenger_id, "passengerId")?;
    observed(Transition::Cancel, state.lifecycle.cancel(id, passenger_id).await)
}
