//! Metrics collection and export for Ridecast.
//!
//! Uses the `metrics` crate for instrumentation and exports
//! to Prometheus format.

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use tracing::info;

/// Metric names.
pub mod names {
    pub const CONNECTIONS_TOTAL: &str = "ridecast_connections_total";
    pub const CONNECTIONS_ACTIVE: &str = "ridecast_connections_active";
    pub const MESSAGES_TOTAL: &str = "ridecast_messages_total";
    pub const MESSAGES_BYTES: &str = "ridecast_messages_bytes";
    pub const CHANNELS_ACTIVE: &str = "ridecast_channels_active";
    pub const SUBSCRIPTIONS_TOTAL: &str = "ridecast_subscriptions_total";
    pub const LOCATIONS_RELAYED: &str = "ridecast_locations_relayed_total";
    pub const RIDE_TRANSITIONS: &str = "ridecast_ride_transitions_total";
    pub const RIDE_TRANSITION_FAILURES: &str = "ridecast_ride_transition_failures_total";
    pub const LATENCY_SECONDS: &str = "ridecast_latency_seconds";
    pub const ERRORS_TOTAL: &str = "ridecast_errors_total";
}

/// Describe every metric to the installed recorder.
///
/// Descriptions sent before a recorder is installed are lost, so this runs
/// after [`start_metrics_server`] has installed the exporter.
pub fn init_metrics() {
    metrics::describe_counter!(
        names::CONNECTIONS_TOTAL,
        "Total number of realtime connections since server start"
    );
    metrics::describe_gauge!(
        names::CONNECTIONS_ACTIVE,
        "Current number of realtime connections"
    );
    metrics::describe_counter!(names::MESSAGES_TOTAL, "Total number of frames processed");
    metrics::describe_counter!(names::MESSAGES_BYTES, "Total bytes of frames processed");
    metrics::describe_gauge!(names::CHANNELS_ACTIVE, "Current number of live channels");
    metrics::describe_counter!(
        names::SUBSCRIPTIONS_TOTAL,
        "Total number of channel joins"
    );
    metrics::describe_counter!(
        names::LOCATIONS_RELAYED,
        "Driver location samples forwarded to ride channels"
    );
    metrics::describe_counter!(
        names::RIDE_TRANSITIONS,
        "Committed ride status changes by action"
    );
    metrics::describe_counter!(
        names::RIDE_TRANSITION_FAILURES,
        "Refused ride operations by action and error kind"
    );
    metrics::describe_histogram!(
        names::LATENCY_SECONDS,
        "Inbound frame processing latency in seconds"
    );
    metrics::describe_counter!(names::ERRORS_TOTAL, "Total number of errors");

    info!("Metrics initialized");
}

/// Install the Prometheus exporter and describe the metrics.
///
/// # Errors
///
/// Returns an error if the server cannot be started.
pub fn start_metrics_server(port: u16) -> anyhow::Result<()> {
    let addr: SocketAddr = format!("0.0.0.0:{port}").parse()?;

    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()?;
    init_metrics();

    info!("Metrics server listening on {}", addr);
    Ok(())
}

/// Record a frame.
pub fn record_message(bytes: usize, direction: &'static str) {
    counter!(names::MESSAGES_TOTAL, "direction" => direction).increment(1);
    counter!(names::MESSAGES_BYTES, "direction" => direction).increment(bytes as u64);
}

/// Record inbound processing latency.
pub fn record_latency(seconds: f64) {
    histogram!(names::LATENCY_SECONDS).record(seconds);
}

/// Record a channel join.
pub fn record_subscription(kind: &'static str) {
    counter!(names::SUBSCRIPTIONS_TOTAL, "kind" => kind).increment(1);
}

/// Update active channel count.
pub fn set_active_channels(count: usize) {
    gauge!(names::CHANNELS_ACTIVE).set(count as f64);
}

/// Record a relayed location sample.
pub fn record_location_relayed() {
    counter!(names::LOCATIONS_RELAYED).increment(1);
}

/// Record a committed ride transition.
pub fn record_transition(action: &'static str) {
    counter!(names::RIDE_TRANSITIONS, "action" => action).increment(1);
}

/// Record a refused ride operation.
pub fn record_transition_failure(action: &'static str, kind: &'static str) {
    counter!(names::RIDE_TRANSITION_FAILURES, "action" => action, "kind" => kind).increment(1);
}

/// Record an error.
pub fn record_error(error_type: &'static str) {
    counter!(names::ERRORS_TOTAL, "type" => error_type).increment(1);
}

/// Metrics guard that records disconnection on drop.
pub struct ConnectionMetricsGuard;

impl ConnectionMetricsGuard {
    /// Create a new metrics guard, recording a connection.
    #[must_use]
    pub fn new() -> Self {
        counter!(names::CONNECTIONS_TOTAL).increment(1);
        gauge!(names::CONNECTIONS_ACTIVE).increment(1.0);
        Self
    }
}

impl Default for ConnectionMetricsGuard {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for ConnectionMetricsGuard {
    fn drop(&mut self) {
        gauge!(names::CONNECTIONS_ACTIVE).decrement(1.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_without_recorder() {
        // No recorder installed: every call is a no-op.
        let _guard = ConnectionMetricsGuard::new();
        record_transition("accept");
        record_transition_failure("accept", "invalid_transition");
        record_message(42, "inbound");
    }

    #[test]
    fn test_descriptions_reach_the_exporter() {
        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();

        metrics::with_local_recorder(&recorder, || {
            init_metrics();
            record_transition("accept");
        });

        let rendered = handle.render();
        assert!(rendered.contains("Committed ride status changes by action"));
        assert!(rendered.contains("action=\"accept\""));
    }
}
