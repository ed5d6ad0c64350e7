//! Connection handlers for the Ridecast server.
//!
//! This module wires the HTTP routes and runs one task per realtime
//! connection.

use crate::api;
use crate::config::Config;
use crate::metrics::{self, ConnectionMetricsGuard};
use anyhow::Result;
use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Router,
};
use bytes::BytesMut;
use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use ridecast_core::{
    ChannelKey, ChannelKind, ConnectionId, Event, EventBus, InMemoryDirectory, InMemoryRideStore,
    LocationRelay, RideLifecycle, RideStore, Subscription, UserDirectory,
};
use ridecast_protocol::{codec, error_codes, Frame, ProtocolError, WireFormat};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Shared server state.
pub struct AppState {
    /// Channel membership and event delivery.
    pub bus: Arc<EventBus>,
    /// Ride state machine.
    pub lifecycle: RideLifecycle,
    /// Driver location forwarding.
    pub relay: LocationRelay,
    /// Server configuration.
    pub config: Config,
    active_connections: AtomicUsize,
}

impl AppState {
    /// Create state backed by the in-memory store, with the directory seeded
    /// from configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        let directory = InMemoryDirectory::new();
        for profile in &config.directory.passengers {
            directory.add_passenger(profile.clone());
        }
        for profile in &config.directory.drivers {
            directory.add_driver(profile.clone());
        }
        info!(
            passengers = config.directory.passengers.len(),
            drivers = config.directory.drivers.len(),
            "Directory seeded"
        );

        Self::with_backends(config, Arc::new(InMemoryRideStore::new()), Arc::new(directory))
    }

    /// Create state over the given store and directory.
    #[must_use]
    pub fn with_backends(
        config: Config,
        store: Arc<dyn RideStore>,
        directory: Arc<dyn UserDirectory>,
    ) -> Self {
        let bus = Arc::new(EventBus::with_config(config.limits.bus_config()));

        let mut lifecycle = RideLifecycle::new(store, directory, bus.clone());
        if let Some(area) = config.service_area {
            lifecycle = lifecycle.with_service_area(area);
        }
        let relay = LocationRelay::new(bus.clone());

        Self {
            bus,
            lifecycle,
            relay,
            config,
            active_connections: AtomicUsize::new(0),
        }
    }

    /// Number of open realtime connections.
    #[must_use]
    pub fn active_connections(&self) -> usize {
        self.active_connections.load(Ordering::Relaxed)
    }
}

/// Build the HTTP/WebSocket application.
pub fn app(state: Arc<AppState>) -> Router {
    Router::new()
        .route(&state.config.transport.websocket_path, get(ws_handler))
        .route("/health", get(health_handler))
        .merge(api::routes())
        .with_state(state)
}

/// Run the HTTP/WebSocket server.
///
/// # Errors
///
/// Returns an error if the server fails to start.
pub async fn run_server(config: Config) -> Result<()> {
    let addr = config.bind_addr()?;

    // Start metrics server if enabled
    if config.metrics.enabled {
        if let Err(e) = metrics::start_metrics_server(config.metrics.port) {
            error!("Failed to start metrics server: {}", e);
        }
    }

    let state = Arc::new(AppState::new(config));
    let listener = TcpListener::bind(addr).await?;

    info!("Ridecast server listening on {}", addr);
    info!(
        "WebSocket endpoint: ws://{}{}",
        addr, state.config.transport.websocket_path
    );

    let bus = state.bus.clone();
    axum::serve(listener, app(state))
        .with_graceful_shutdown(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("Failed to listen for shutdown signal: {}", e);
                std::future::pending::<()>().await;
            }
            info!("Shutdown signal received");
            bus.shutdown();
        })
        .await?;

    Ok(())
}

/// Health check handler.
async fn health_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let stats = state.bus.stats();
    axum::Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "connections": state.active_connections(),
        "channels": stats.channel_count,
    }))
}

#[derive(Debug, Default, Deserialize)]
struct ConnectParams {
    /// `json` to start in text mode.
    format: Option<String>,
}

/// WebSocket upgrade handler.
async fn ws_handler(
    ws: WebSocketUpgrade,
    Query(params): Query<ConnectParams>,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    if state.active_connections() >= state.config.limits.max_connections {
        warn!("Connection limit reached, refusing upgrade");
        metrics::record_error("connection_limit");
        return (StatusCode::SERVICE_UNAVAILABLE, "too many connections").into_response();
    }

    let format = match params.format.as_deref() {
        Some("json") => WireFormat::Json,
        _ => WireFormat::MessagePack,
    };
    let max_message_size = state.config.limits.max_message_size;

    ws.max_message_size(max_message_size)
        .on_upgrade(move |socket| handle_websocket(socket, state, format))
        .into_response()
}

type WsSink = SplitSink<WebSocket, Message>;

/// Per-connection state.
struct Session {
    id: ConnectionId,
    format: WireFormat,
    state: Arc<AppState>,
    /// One forwarding task per joined channel.
    forwarders: HashMap<ChannelKey, JoinHandle<()>>,
    events_tx: mpsc::UnboundedSender<Arc<Event>>,
}

impl Session {
    fn encode(&self, frame: &Frame) -> Result<Message, ProtocolError> {
        match self.format {
            WireFormat::MessagePack => Ok(Message::Binary(codec::encode(frame)?.to_vec())),
            WireFormat::Json => Ok(Message::Text(codec::encode_json(frame)?)),
        }
    }

    async fn send(&self, sender: &mut WsSink, frame: &Frame) -> Result<()> {
        let message = self.encode(frame)?;
        let len = match &message {
            Message::Binary(data) => data.len(),
            Message::Text(text) => text.len(),
            _ => 0,
        };
        metrics::record_message(len, "outbound");
        sender.send(message).await?;
        Ok(())
    }

    /// Join a channel and start forwarding its events.
    fn join(&mut self, key: ChannelKey) -> Result<(), ridecast_core::BusError> {
        let subscription = match key {
            ChannelKey::User(user_id) => self.state.bus.register(user_id, &self.id)?,
            ChannelKey::Ride(ride_id) => self.state.bus.subscribe_to_ride(ride_id, &self.id)?,
        };
        let handle = spawn_forwarder(subscription, self.events_tx.clone());
        self.forwarders.insert(key, handle);

        metrics::record_subscription(match key.kind() {
            ChannelKind::User => "user",
            ChannelKind::Ride => "ride",
        });
        metrics::set_active_channels(self.state.bus.stats().channel_count);
        Ok(())
    }

    fn reply_to_join(&mut self, id: Option<u64>, key: ChannelKey) -> Option<Frame> {
        match self.join(key) {
            Ok(()) => {
                debug!(connection = %self.id, channel = %key, "Joined channel");
                id.map(Frame::ack)
            }
            Err(e) => {
                warn!(connection = %self.id, channel = %key, error = %e, "Join failed");
                Some(Frame::error(
                    id.unwrap_or_default(),
                    error_codes::SUBSCRIBE_FAILED,
                    e.to_string(),
                ))
            }
        }
    }

    /// Handle one inbound frame, returning the reply if any.
    fn handle_frame(&mut self, frame: Frame) -> Option<Frame> {
        match frame {
            Frame::Register { id, user_id } => {
                debug!(connection = %self.id, user = user_id, "Register request");
                self.reply_to_join(id, ChannelKey::User(user_id))
            }

            Frame::SubscribeToRide { id, ride_id } => {
                debug!(connection = %self.id, ride = ride_id, "Subscribe request");
                self.reply_to_join(id, ChannelKey::Ride(ride_id))
            }

            Frame::UnsubscribeFromRide { id, ride_id } => {
                let key = ChannelKey::Ride(ride_id);
                debug!(connection = %self.id, channel = %key, "Unsubscribe request");

                if let Some(handle) = self.forwarders.remove(&key) {
                    handle.abort();
                }
                match self.state.bus.leave(key, &self.id) {
                    Ok(()) => {
                        metrics::set_active_channels(self.state.bus.stats().channel_count);
                        id.map(Frame::ack)
                    }
                    Err(e) => Some(Frame::error(
                        id.unwrap_or_default(),
                        error_codes::UNSUBSCRIBE_FAILED,
                        e.to_string(),
                    )),
                }
            }

            Frame::DriverLocationUpdate { ride_id, location } => {
                if self.state.relay.relay(&self.id, ride_id, location).is_some() {
                    metrics::record_location_relayed();
                }
                None
            }

            Frame::Ping { timestamp } => Some(Frame::pong(timestamp)),

            Frame::Pong { .. } => None,

            other => {
                warn!(
                    connection = %self.id,
                    frame_type = ?other.frame_type(),
                    "Unexpected frame type"
                );
                None
            }
        }
    }

    fn close(self) {
        for (_, handle) in self.forwarders {
            handle.abort();
        }
        let left = self.state.bus.disconnect(&self.id);
        metrics::set_active_channels(self.state.bus.stats().channel_count);
        debug!(connection = %self.id, channels = left.len(), "Memberships dropped");
    }
}

/// Forward a subscription's events into the connection's outbound queue.
fn spawn_forwarder(
    mut subscription: Subscription,
    tx: mpsc::UnboundedSender<Arc<Event>>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = subscription.recv().await {
            if tx.send(event).is_err() {
                break; // Connection gone
            }
        }
    })
}

fn malformed(error: &ProtocolError) -> Frame {
    Frame::error(0, error_codes::MALFORMED, error.to_string())
}

/// Heartbeat interval as carried by the `connected` frame, saturating.
fn announced_interval(interval_ms: u64) -> u32 {
    u32::try_from(interval_ms).unwrap_or(u32::MAX)
}

/// Handle a WebSocket connection.
async fn handle_websocket(socket: WebSocket, state: Arc<AppState>, format: WireFormat) {
    let _metrics_guard = ConnectionMetricsGuard::new();
    state.active_connections.fetch_add(1, Ordering::Relaxed);

    let connection_id = ConnectionId::generate();
    debug!(connection = %connection_id, ?format, "WebSocket connected");

    let (mut sender, mut receiver) = socket.split();
    let (events_tx, mut events_rx) = mpsc::unbounded_channel::<Arc<Event>>();

    let heartbeat = state.config.heartbeat.clone();
    let mut session = Session {
        id: connection_id.clone(),
        format,
        state: Arc::clone(&state),
        forwarders: HashMap::new(),
        events_tx,
    };

    let connected = Frame::connected(
        connection_id.as_str(),
        announced_interval(heartbeat.interval_ms),
    );
    if session.send(&mut sender, &connected).await.is_err() {
        error!(connection = %connection_id, "Failed to send Connected frame");
        session.close();
        state.active_connections.fetch_sub(1, Ordering::Relaxed);
        return;
    }

    // Read buffer for partial binary frames
    let mut read_buffer = BytesMut::with_capacity(4096);

    let timeout = Duration::from_millis(heartbeat.timeout_ms);
    let idle = tokio::time::sleep(timeout);
    tokio::pin!(idle);

    loop {
        tokio::select! {
            biased;

            // Events from joined channels. A delivered event keeps a
            // listen-only connection alive.
            Some(event) = events_rx.recv() => {
                let frame = Frame::event(
                    event.channel.to_string(),
                    event.name.clone(),
                    event.payload.clone(),
                );
                if session.send(&mut sender, &frame).await.is_err() {
                    break;
                }
                idle.as_mut().reset(tokio::time::Instant::now() + timeout);
            }

            // Receive from WebSocket
            msg = receiver.next() => {
                idle.as_mut().reset(tokio::time::Instant::now() + timeout);

                let frames: Vec<Result<Frame, ProtocolError>> = match msg {
                    Some(Ok(Message::Binary(data))) => {
                        metrics::record_message(data.len(), "inbound");
                        read_buffer.extend_from_slice(&data);

                        let mut frames = Vec::new();
                        loop {
                            match codec::decode_from(&mut read_buffer) {
                                Ok(Some(frame)) => frames.push(Ok(frame)),
                                Ok(None) => break,
                                Err(e) => {
                                    read_buffer.clear();
                                    frames.push(Err(e));
                                    break;
                                }
                            }
                        }
                        frames
                    }
                    Some(Ok(Message::Text(text))) => {
                        metrics::record_message(text.len(), "inbound");
                        if session.format != WireFormat::Json {
                            debug!(connection = %connection_id, "Switching to JSON frames");
                            session.format = WireFormat::Json;
                        }
                        vec![codec::decode_json(&text)]
                    }
                    Some(Ok(Message::Ping(data))) => {
                        if sender.send(Message::Pong(data)).await.is_err() {
                            break;
                        }
                        continue;
                    }
                    Some(Ok(Message::Pong(_))) => continue,
                    Some(Ok(Message::Close(_))) => {
                        debug!(connection = %connection_id, "Received close frame");
                        break;
                    }
                    Some(Err(e)) => {
                        warn!(connection = %connection_id, error = %e, "WebSocket error");
                        metrics::record_error("websocket");
                        break;
                    }
                    None => {
                        debug!(connection = %connection_id, "WebSocket stream ended");
                        break;
                    }
                };

                let start = Instant::now();
                let mut failed = false;
                for frame in frames {
                    let reply = match frame {
                        Ok(frame) => session.handle_frame(frame),
                        Err(e) => {
                            warn!(connection = %connection_id, error = %e, "Malformed frame");
                            metrics::record_error("malformed");
                            Some(malformed(&e))
                        }
                    };
                    if let Some(reply) = reply {
                        if session.send(&mut sender, &reply).await.is_err() {
                            failed = true;
                            break;
                        }
                    }
                }
                metrics::record_latency(start.elapsed().as_secs_f64());
                if failed {
                    break;
                }
            }

            () = &mut idle => {
                debug!(connection = %connection_id, "Heartbeat timeout");
                break;
            }
        }
    }

    session.close();
    state.active_connections.fetch_sub(1, Ordering::Relaxed);
    debug!(connection = %connection_id, "WebSocket disconnected");
}
