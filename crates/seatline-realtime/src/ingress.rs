//! Inbound frame handling for connected sockets.
//!
//! Drivers send location fixes and status changes; everyone may ping. A
//! rejected frame gets an `error` reply and the socket stays registered.

use std::sync::Arc;

use tracing::{debug, warn};

use seatline_core::error::AppError;
use seatline_core::result::AppResult;
use seatline_core::types::{DriverId, TripId};
use seatline_entity::trip::TripStatus;
use seatline_service::{LocationUpdate, TrackingService, TripService};

use crate::connection::{ConnectionHandle, ConnectionRole};
use crate::hub::BroadcastHub;
use crate::message::{InboundFrame, OutboundFrame};

/// Code sent for frames that do not parse.
pub const INVALID_MESSAGE: &str = "INVALID_MESSAGE";
/// Code sent when a socket's role may not send the frame.
pub const FORBIDDEN: &str = "FORBIDDEN";

/// Routes inbound frames to the tracking and trip services.
#[derive(Debug, Clone)]
pub struct DriverIngress {
    /// Hub that owns the sockets.
    hub: Arc<BroadcastHub>,
    /// Location ingest.
    tracking: Arc<TrackingService>,
    /// Status transitions.
    trips: Arc<TripService>,
}

impl DriverIngress {
    /// Creates a new ingress router.
    pub fn new(
        hub: Arc<BroadcastHub>,
        tracking: Arc<TrackingService>,
        trips: Arc<TripService>,
    ) -> Self {
        Self {
            hub,
            tracking,
            trips,
        }
    }

    /// The hub the sockets are registered on.
    pub fn hub(&self) -> &Arc<BroadcastHub> {
        &self.hub
    }

    /// Handle one text frame and send the reply to the same socket.
    /// Returns the reply.
    pub async fn handle_frame(&self, conn: &ConnectionHandle, raw: &str) -> OutboundFrame {
        let reply = match serde_json::from_str::<InboundFrame>(raw) {
            Ok(frame) => self.dispatch(conn, frame).await,
            Err(e) => {
                debug!(conn_id = %conn.id, error = %e, "Malformed frame");
                OutboundFrame::error(INVALID_MESSAGE, format!("Malformed frame: {e}"))
            }
        };

        match serde_json::to_string(&reply) {
            Ok(text) => {
                if !conn.send(&text) {
                    debug!(conn_id = %conn.id, "Reply not delivered");
                }
            }
            Err(e) => warn!(conn_id = %conn.id, error = %e, "Failed to serialize reply"),
        }
        reply
    }

    async fn dispatch(&self, conn: &ConnectionHandle, frame: InboundFrame) -> OutboundFrame {
        let driver_id = match (conn.role, &frame) {
            (_, InboundFrame::Ping) => return OutboundFrame::Pong,
            (ConnectionRole::Driver { driver_id }, _) => driver_id,
            _ => {
                return OutboundFrame::error(
                    FORBIDDEN,
                    format!("Only drivers may send {}", frame.kind()),
                );
            }
        };

        let result = match frame {
            InboundFrame::LocationUpdate(update) => self.accept_location(driver_id, update).await,
            InboundFrame::StatusUpdate { trip_id, status } => {
                self.accept_status(driver_id, trip_id, status).await
            }
            InboundFrame::Ping => return OutboundFrame::Pong,
        };

        match result {
            Ok(trip_id) => OutboundFrame::Ack { trip_id },
            Err(e) => {
                debug!(driver_id = %driver_id, error = %e, "Driver frame rejected");
                OutboundFrame::from_error(&e)
            }
        }
    }

    async fn accept_location(
        &self,
        driver_id: DriverId,
        update: LocationUpdate,
    ) -> AppResult<TripId> {
        let trip = self.trips.get_trip(update.trip_id).await?;
        if trip.driver_id.is_some_and(|assigned| assigned != driver_id) {
            return Err(AppError::invalid_state(format!(
                "Trip {} is assigned to another driver",
                trip.id
            )));
        }
        let location = self.tracking.update_trip_location(update).await?;
        Ok(location.trip_id)
    }

    async fn accept_status(
        &self,
        driver_id: DriverId,
        trip_id: TripId,
        status: TripStatus,
    ) -> AppResult<TripId> {
        let trip = self
            .trips
            .transition_status(trip_id, status, Some(driver_id))
            .await?;
        Ok(trip.id)
    }
}

#[cfg(test)]
mod tests {
    use seatline_cache::CacheManager;
    use seatline_core::config::AppConfig;
    use seatline_core::types::UserId;
    use seatline_database::MemoryLedger;
    use seatline_entity::trip::Trip;
    use seatline_service::{Collaborators, Services, Stores};

    use super::*;

    struct Fixture {
        ledger: Arc<MemoryLedger>,
        hub: Arc<BroadcastHub>,
        ingress: DriverIngress,
    }

    fn fixture() -> Fixture {
        let config = AppConfig::default();
        let ledger = Arc::new(MemoryLedger::new());
        let hub = Arc::new(BroadcastHub::local(&config.realtime));
        let cache = CacheManager::in_memory(&config.cache);
        let services = Services::build(
            Stores::shared(ledger.clone()),
            cache,
            Collaborators::with_publisher(hub.clone()),
            &config,
        );
        let ingress = DriverIngress::new(hub.clone(), services.tracking, services.trips);
        Fixture {
            ledger,
            hub,
            ingress,
        }
    }

    fn trip(driver_id: DriverId, status: TripStatus) -> Trip {
        let departure = chrono::Utc::now() + chrono::Duration::hours(2);
        Trip {
            id: TripId::new(),
            route_name: "Harbor Loop".to_string(),
            vehicle_capacity: 12,
            departure_time: departure,
            arrival_time: departure + chrono::Duration::hours(1),
            status,
            fare_cents: 1200,
            destination_latitude: 10.3157,
            destination_longitude: 123.8854,
            driver_id: Some(driver_id),
            booked_seats: 0,
        }
    }

    fn status_frame(trip_id: TripId, status: &str) -> String {
        serde_json::json!({
            "type": "status_update",
            "data": {"trip_id": trip_id, "status": status},
        })
        .to_string()
    }

    #[tokio::test]
    async fn test_malformed_frame_keeps_socket() {
        let f = fixture();
        let (driver, mut rx) = f.hub.register_driver(DriverId::new()).await;

        let reply = f.ingress.handle_frame(&driver, "{not json").await;
        assert!(matches!(reply, OutboundFrame::Error { ref code, .. } if code == INVALID_MESSAGE));
        let sent: serde_json::Value = serde_json::from_str(&rx.recv().await.unwrap()).unwrap();
        assert_eq!(sent["type"], "error");
        assert!(f.hub.registry().contains(&driver.id));
        assert!(driver.is_open());
    }

    #[tokio::test]
    async fn test_passenger_may_only_ping() {
        let f = fixture();
        let trip_id = TripId::new();
        let (passenger, _rx) = f.hub.register_passenger(trip_id, Some(UserId::new())).await;

        let raw = status_frame(trip_id, "CANCELLED");
        let reply = f.ingress.handle_frame(&passenger, &raw).await;
        assert!(matches!(reply, OutboundFrame::Error { ref code, .. } if code == FORBIDDEN));

        let reply = f.ingress.handle_frame(&passenger, r#"{"type":"ping"}"#).await;
        assert_eq!(reply, OutboundFrame::Pong);
    }

    #[tokio::test]
    async fn test_driver_location_fans_out_to_passengers() {
        let f = fixture();
        let driver_id = DriverId::new();
        let trip = trip(driver_id, TripStatus::InTransit);
        f.ledger.upsert_trip(trip.clone());
        let (driver, _drx) = f.hub.register_driver(driver_id).await;
        let (_passenger, mut prx) = f.hub.register_passenger(trip.id, None).await;

        let raw = serde_json::json!({
            "type": "location_update",
            "data": {"trip_id": trip.id, "latitude": 10.5, "longitude": 123.9, "speed": 40.0},
        })
        .to_string();
        let reply = f.ingress.handle_frame(&driver, &raw).await;
        assert_eq!(reply, OutboundFrame::Ack { trip_id: trip.id });

        let json: serde_json::Value = serde_json::from_str(&prx.recv().await.unwrap()).unwrap();
        assert_eq!(json["type"], "location_update");
        assert_eq!(json["data"]["latitude"], 10.5);
    }

    #[tokio::test]
    async fn test_status_update_from_other_driver_is_rejected() {
        let f = fixture();
        let trip = trip(DriverId::new(), TripStatus::Scheduled);
        f.ledger.upsert_trip(trip.clone());
        let (intruder, _rx) = f.hub.register_driver(DriverId::new()).await;

        let raw = status_frame(trip.id, "BOARDING");
        let reply = f.ingress.handle_frame(&intruder, &raw).await;
        assert!(matches!(reply, OutboundFrame::Error { ref code, .. } if code == "INVALID_STATE"));
    }

    #[tokio::test]
    async fn test_status_update_is_broadcast() {
        let f = fixture();
        let driver_id = DriverId::new();
        let trip = trip(driver_id, TripStatus::Scheduled);
        f.ledger.upsert_trip(trip.clone());
        let (driver, _drx) = f.hub.register_driver(driver_id).await;
        let (_passenger, mut prx) = f.hub.register_passenger(trip.id, None).await;

        let raw = status_frame(trip.id, "BOARDING");
        let reply = f.ingress.handle_frame(&driver, &raw).await;
        assert_eq!(reply, OutboundFrame::Ack { trip_id: trip.id });

        let frame: OutboundFrame = serde_json::from_str(&prx.recv().await.unwrap()).unwrap();
        assert!(matches!(
            frame,
            OutboundFrame::StatusUpdate {
                status: TripStatus::Boarding,
                previous: TripStatus::Scheduled,
                ..
            }
        ));
    }
}
