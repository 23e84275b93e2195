//! Integration tests for socket fanout, driver frames, and the HTTP surface.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::Duration;
use tower::ServiceExt;

use seatline_core::types::{DriverId, TripId, UserId};
use seatline_entity::booking::{BookingStatus, PaymentStatus};
use seatline_realtime::OutboundFrame;

use crate::helpers::{DEST_LAT, DEST_LON, TestApp};

#[tokio::test]
async fn test_fanout_drops_dead_sockets() {
    let app = TestApp::new().await;
    let driver_id = DriverId::new();
    let trip = app.add_running_trip(driver_id);
    let hub = app.hub();

    let (_a, mut rx_a) = hub.register_passenger(trip.id, None).await;
    let (_b, mut rx_b) = hub.register_passenger(trip.id, None).await;
    let (gone, rx_gone) = hub.register_passenger(trip.id, None).await;
    drop(rx_gone);

    let (driver, _drx) = hub.register_driver(driver_id).await;
    let raw = format!(
        r#"{{"type":"location_update","data":{{"trip_id":"{}","latitude":{},"longitude":{}}}}}"#,
        trip.id,
        DEST_LAT + 0.05,
        DEST_LON
    );
    let reply = app.runtime.state.ingress.handle_frame(&driver, &raw).await;
    assert_eq!(reply, OutboundFrame::Ack { trip_id: trip.id });

    for rx in [&mut rx_a, &mut rx_b] {
        let frame: OutboundFrame = serde_json::from_str(&rx.recv().await.unwrap()).unwrap();
        assert!(matches!(frame, OutboundFrame::LocationUpdate(ref l) if l.trip_id == trip.id));
    }
    assert!(!hub.registry().contains(&gone.id));
    assert_eq!(hub.registry().trip_subscriber_count(trip.id).await, 2);
}

#[tokio::test]
async fn test_fanout_is_scoped_to_trip() {
    let app = TestApp::new().await;
    let trip = app.add_running_trip(DriverId::new());
    let other = TripId::new();
    let (_watcher, mut rx) = app.hub().register_passenger(other, None).await;

    let far = seatline_service::LocationUpdate::at(trip.id, DEST_LAT + 0.05, DEST_LON);
    app.services().tracking.update_trip_location(far).await.unwrap();
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn test_booking_updates_reach_the_user() {
    let app = TestApp::new().await;
    let trip = app.add_trip(10, Duration::hours(5));
    let user = UserId::new();
    let (_conn, mut rx) = app.hub().register_user(user).await;

    let bookings = &app.services().bookings;
    let booking = bookings.create_booking(user, trip.id, &[2]).await.unwrap();
    bookings
        .update_booking_payment_status(booking.id, PaymentStatus::Completed)
        .await
        .unwrap();

    let mut confirmed = None;
    while let Ok(text) = rx.try_recv() {
        let frame: OutboundFrame = serde_json::from_str(&text).unwrap();
        if let OutboundFrame::BookingUpdate {
            booking_id,
            status,
            payment_status,
            ..
        } = frame
        {
            if booking_id == booking.id && status == BookingStatus::Confirmed {
                confirmed = Some(payment_status);
            }
        }
    }
    assert_eq!(confirmed, Some(PaymentStatus::Completed));
}

#[tokio::test]
async fn test_health_endpoint() {
    let app = TestApp::new().await;
    let (_conn, _rx) = app.hub().register_user(UserId::new()).await;
    let router = seatline_api::build_app(app.runtime.state.clone());

    let response = router
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(json["status"], "ok");
    assert_eq!(json["connections"]["users"], 1);
}

#[tokio::test]
async fn test_shutdown_closes_sockets() {
    let app = TestApp::new().await;
    let (conn, _rx) = app.hub().register_passenger(TripId::new(), None).await;
    let hub = app.hub().clone();

    app.runtime.shutdown().await;
    assert!(hub.is_shut_down());
    assert!(!conn.is_open());
    assert_eq!(hub.connection_counts().connections, 0);
}
