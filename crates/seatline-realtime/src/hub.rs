//! The broadcast hub: socket registration, per-trip fanout, unicast to
//! drivers and users, and the relay between instances.
//!
//! The hub is created once at startup, handed to the API state and to the
//! services as their [`EventPublisher`], and stopped with
//! [`BroadcastHub::shutdown`].

use std::sync::Arc;

use async_trait::async_trait;
use futures::StreamExt;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use seatline_core::config::RealtimeConfig;
use seatline_core::result::AppResult;
use seatline_core::types::{DriverId, TripId, UserId};
use seatline_entity::event::{DomainEvent, TripEvent};
use seatline_service::EventPublisher;

use crate::connection::{
    ConnectionCounts, ConnectionHandle, ConnectionId, ConnectionRole, DeliveryReport,
    SocketRegistry,
};
use crate::message::OutboundFrame;
use crate::transport::{BroadcastTransport, Envelope, LocalTransport, Target};

/// Registers sockets and delivers frames to them.
#[derive(Debug)]
pub struct BroadcastHub {
    /// Every socket on this instance.
    registry: SocketRegistry,
    /// Carries frames to peer instances.
    transport: Arc<dyn BroadcastTransport>,
    /// Identifies this instance's envelopes.
    instance_id: Uuid,
    /// Per-connection outbound buffer.
    buffer_size: usize,
    /// Cancelled by [`BroadcastHub::shutdown`].
    shutdown: CancellationToken,
}

impl BroadcastHub {
    /// Creates a hub on the given transport.
    pub fn new(transport: Arc<dyn BroadcastTransport>, config: &RealtimeConfig) -> Self {
        let instance_id = Uuid::new_v4();
        info!(
            instance_id = %instance_id,
            transport = transport.name(),
            buffer = config.channel_buffer_size,
            "Broadcast hub initialized"
        );
        Self {
            registry: SocketRegistry::new(),
            transport,
            instance_id,
            buffer_size: config.channel_buffer_size.max(1),
            shutdown: CancellationToken::new(),
        }
    }

    /// A single-instance hub.
    pub fn local(config: &RealtimeConfig) -> Self {
        Self::new(Arc::new(LocalTransport), config)
    }

    /// This instance's ID.
    pub fn instance_id(&self) -> Uuid {
        self.instance_id
    }

    /// The socket registry.
    pub fn registry(&self) -> &SocketRegistry {
        &self.registry
    }

    /// Register a passenger socket on a trip, also reachable as the user's
    /// socket when `user_id` is given.
    pub async fn register_passenger(
        &self,
        trip_id: TripId,
        user_id: Option<UserId>,
    ) -> (Arc<ConnectionHandle>, mpsc::Receiver<String>) {
        self.register(ConnectionRole::Passenger { trip_id, user_id }).await
    }

    /// Register a driver socket. An older socket for the same driver is closed.
    pub async fn register_driver(
        &self,
        driver_id: DriverId,
    ) -> (Arc<ConnectionHandle>, mpsc::Receiver<String>) {
        self.register(ConnectionRole::Driver { driver_id }).await
    }

    /// Register a user socket for booking updates.
    pub async fn register_user(
        &self,
        user_id: UserId,
    ) -> (Arc<ConnectionHandle>, mpsc::Receiver<String>) {
        self.register(ConnectionRole::User { user_id }).await
    }

    async fn register(
        &self,
        role: ConnectionRole,
    ) -> (Arc<ConnectionHandle>, mpsc::Receiver<String>) {
        let (tx, rx) = mpsc::channel(self.buffer_size);
        let handle = Arc::new(ConnectionHandle::new(role, tx));
        if self.shutdown.is_cancelled() {
            handle.close();
            return (handle, rx);
        }
        handle.open();
        self.registry.add(handle.clone()).await;
        // A shutdown that drained during the insert can leave partial index
        // entries behind. Draining again is idempotent once cancelled.
        if self.shutdown.is_cancelled() {
            self.registry.drain();
            handle.close();
            return (handle, rx);
        }
        debug!(conn_id = %handle.id, role = ?handle.role, "Socket registered");
        (handle, rx)
    }

    /// Deregister and close a socket. Safe to call more than once.
    pub async fn unregister(&self, conn_id: &ConnectionId) {
        if let Some(handle) = self.registry.remove(conn_id).await {
            handle.close();
            debug!(conn_id = %conn_id, "Socket unregistered");
        }
    }

    /// Send a frame to every subscriber of a trip, then hand it to peers.
    pub async fn broadcast_to_trip(
        &self,
        trip_id: TripId,
        frame: &OutboundFrame,
    ) -> DeliveryReport {
        let Some(text) = encode(frame) else {
            return DeliveryReport::default();
        };
        let report = self.registry.fanout_trip(trip_id, &text).await;
        if report.removed > 0 {
            debug!(
                trip_id = %trip_id,
                removed = report.removed,
                "Removed failed sockets during fanout"
            );
        }
        self.relay(Target::Trip(trip_id), text).await;
        report
    }

    /// Send a frame to a driver. Returns whether a local socket took it.
    pub async fn send_to_driver(&self, driver_id: DriverId, frame: &OutboundFrame) -> bool {
        let Some(text) = encode(frame) else {
            return false;
        };
        let delivered = self.registry.send_to_driver(driver_id, &text).await;
        if !delivered {
            self.relay(Target::Driver(driver_id), text).await;
        }
        delivered
    }

    /// Send a frame to every socket of a user.
    pub async fn send_to_user(&self, user_id: UserId, frame: &OutboundFrame) -> DeliveryReport {
        let Some(text) = encode(frame) else {
            return DeliveryReport::default();
        };
        let report = self.registry.send_to_user(user_id, &text).await;
        self.relay(Target::User(user_id), text).await;
        report
    }

    /// Registry sizes.
    pub fn connection_counts(&self) -> ConnectionCounts {
        self.registry.counts()
    }

    /// Subscribe to the transport and deliver peer frames to local sockets
    /// until shutdown. Returns `None` for transports without peers.
    pub async fn start_relay(self: &Arc<Self>) -> AppResult<Option<JoinHandle<()>>> {
        let Some(mut stream) = self.transport.subscribe().await? else {
            return Ok(None);
        };

        let hub = Arc::clone(self);
        let task = tokio::spawn(async move {
            info!(
                instance_id = %hub.instance_id,
                transport = hub.transport.name(),
                "Relay started"
            );
            loop {
                tokio::select! {
                    _ = hub.shutdown.cancelled() => break,
                    next = stream.next() => match next {
                        Some(envelope) => hub.deliver_relayed(envelope).await,
                        None => {
                            warn!("Relay stream ended");
                            break;
                        }
                    },
                }
            }
            info!("Relay stopped");
        });
        Ok(Some(task))
    }

    /// Deliver a peer's envelope to local sockets. Own envelopes are skipped.
    pub async fn deliver_relayed(&self, envelope: Envelope) {
        if envelope.instance_id == self.instance_id {
            return;
        }
        match envelope.target {
            Target::Trip(trip_id) => {
                self.registry.fanout_trip(trip_id, &envelope.frame).await;
            }
            Target::Driver(driver_id) => {
                self.registry.send_to_driver(driver_id, &envelope.frame).await;
            }
            Target::User(user_id) => {
                self.registry.send_to_user(user_id, &envelope.frame).await;
            }
        }
    }

    /// Stop the relay and close every socket.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
        let closed = self.registry.drain();
        info!(closed, "Broadcast hub shut down");
    }

    /// Whether [`BroadcastHub::shutdown`] has run.
    pub fn is_shut_down(&self) -> bool {
        self.shutdown.is_cancelled()
    }

    async fn relay(&self, target: Target, frame: String) {
        let envelope = Envelope {
            instance_id: self.instance_id,
            target,
            frame,
        };
        if let Err(e) = self.transport.publish(&envelope).await {
            warn!(transport = self.transport.name(), error = %e, "Relay publish failed");
        }
    }
}

#[async_trait]
impl EventPublisher for BroadcastHub {
    async fn publish(&self, event: DomainEvent) {
        match event {
            DomainEvent::Trip(TripEvent::LocationUpdated { location }) => {
                let trip_id = location.trip_id;
                self.broadcast_to_trip(trip_id, &OutboundFrame::LocationUpdate(location))
                    .await;
            }
            DomainEvent::Trip(TripEvent::StatusChanged {
                trip_id,
                from,
                to,
                changed_at,
                ..
            }) => {
                let frame = OutboundFrame::StatusUpdate {
                    trip_id,
                    status: to,
                    previous: from,
                    changed_at,
                };
                self.broadcast_to_trip(trip_id, &frame).await;
            }
            DomainEvent::Trip(TripEvent::Arrived {
                trip_id,
                distance_meters,
                ..
            }) => {
                // Subscribers already got the ARRIVED status_update.
                debug!(trip_id = %trip_id, distance_m = distance_meters, "Arrival observed");
            }
            DomainEvent::Booking(booking) => {
                let frame = OutboundFrame::BookingUpdate {
                    booking_id: booking.booking_id,
                    reference: booking.reference,
                    status: booking.status,
                    payment_status: booking.payment_status,
                };
                self.send_to_user(booking.user_id, &frame).await;
            }
        }
    }
}

fn encode(frame: &OutboundFrame) -> Option<String> {
    match serde_json::to_string(frame) {
        Ok(text) => Some(text),
        Err(e) => {
            error!(error = %e, "Failed to serialize outbound frame");
            None
        }
    }
}
