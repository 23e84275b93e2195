//! Integration tests for location ingest and arrival detection.

use seatline_core::ErrorKind;
use seatline_core::types::DriverId;
use seatline_entity::trip::TripStatus;
use seatline_realtime::OutboundFrame;
use seatline_service::LocationUpdate;

use crate::helpers::{DEST_LAT, DEST_LON, TestApp};

#[tokio::test]
async fn test_location_history_and_current() {
    let app = TestApp::new().await;
    let trip = app.add_running_trip(DriverId::new());
    let tracking = &app.services().tracking;

    for step in 0..5_i32 {
        let lat = DEST_LAT + 0.1 - f64::from(step) * 0.01;
        tracking
            .update_trip_location(LocationUpdate::at(trip.id, lat, DEST_LON))
            .await
            .unwrap();
    }

    let current = tracking.get_current_location(trip.id).await.unwrap().unwrap();
    assert!((current.latitude - (DEST_LAT + 0.06)).abs() < 1e-9);

    let history = tracking.get_location_history(trip.id, 3).await.unwrap();
    assert_eq!(history.len(), 3);
    assert!(history[0].recorded_at >= history[1].recorded_at);
    assert_eq!(history[0].id, current.id);

    // Zero is clamped up to one.
    assert_eq!(tracking.get_location_history(trip.id, 0).await.unwrap().len(), 1);

    let trip_now = app.services().trips.get_trip(trip.id).await.unwrap();
    assert_eq!(trip_now.status, TripStatus::InTransit);
}

#[tokio::test]
async fn test_invalid_coordinates_rejected() {
    let app = TestApp::new().await;
    let trip = app.add_running_trip(DriverId::new());

    let err = app
        .services()
        .tracking
        .update_trip_location(LocationUpdate::at(trip.id, 91.0, 0.0))
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Validation);
    assert!(app.services().tracking.get_current_location(trip.id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_scheduled_trip_does_not_accept_locations() {
    let app = TestApp::new().await;
    let trip = app.add_trip(10, chrono::Duration::hours(1));

    let err = app
        .services()
        .tracking
        .update_trip_location(LocationUpdate::at(trip.id, DEST_LAT, DEST_LON))
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvalidState);
}

#[tokio::test]
async fn test_arrival_is_announced_once() {
    let app = TestApp::new().await;
    let trip = app.add_running_trip(DriverId::new());
    let (_passenger, mut rx) = app.hub().register_passenger(trip.id, None).await;
    let tracking = &app.services().tracking;

    // About 30 m from the terminal, inside the 100 m geofence.
    let near = || LocationUpdate::at(trip.id, DEST_LAT + 0.00027, DEST_LON);
    let (first, second) = tokio::join!(
        tracking.update_trip_location(near()),
        tracking.update_trip_location(near()),
    );
    assert!(first.is_ok() || second.is_ok());

    let trip_now = app.services().trips.get_trip(trip.id).await.unwrap();
    assert_eq!(trip_now.status, TripStatus::Arrived);

    let mut arrivals = 0;
    while let Ok(text) = rx.try_recv() {
        let frame: OutboundFrame = serde_json::from_str(&text).unwrap();
        if let OutboundFrame::StatusUpdate { status, previous, .. } = frame {
            assert_eq!(status, TripStatus::Arrived);
            assert_eq!(previous, TripStatus::InTransit);
            arrivals += 1;
        }
    }
    assert_eq!(arrivals, 1);

    let err = tracking.update_trip_location(near()).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvalidState);
}

#[tokio::test]
async fn test_far_fix_does_not_arrive() {
    let app = TestApp::new().await;
    let trip = app.add_running_trip(DriverId::new());

    // About 1.1 km north.
    app.services()
        .tracking
        .update_trip_location(LocationUpdate::at(trip.id, DEST_LAT + 0.01, DEST_LON))
        .await
        .unwrap();
    let trip_now = app.services().trips.get_trip(trip.id).await.unwrap();
    assert_eq!(trip_now.status, TripStatus::InTransit);
}
