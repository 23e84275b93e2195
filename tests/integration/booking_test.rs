//! Integration tests for holds and the booking transaction.

use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::Duration;

use seatline_core::ErrorKind;
use seatline_core::types::UserId;
use seatline_entity::booking::{BookingStatus, PaymentStatus};

use crate::helpers::TestApp;

#[tokio::test]
async fn test_hold_then_book_flow() {
    let app = TestApp::new().await;
    let trip = app.add_trip(50, Duration::hours(5));
    let alice = UserId::new();
    let bob = UserId::new();

    let receipt = app
        .services()
        .holds
        .create_hold(trip.id, alice, &[1, 2], None)
        .await
        .unwrap();
    assert_eq!(receipt.seats, vec![1, 2]);

    let availability = app.services().availability.get_availability(trip.id).await.unwrap();
    assert_eq!(availability.held, vec![1, 2]);
    assert_eq!(availability.available.len(), 48);

    let err = app
        .services()
        .holds
        .create_hold(trip.id, bob, &[1], None)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::SeatNotAvailable);

    let err = app
        .services()
        .bookings
        .create_booking(bob, trip.id, &[2])
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::SeatNotAvailable);

    let booking = app
        .services()
        .bookings
        .create_booking(alice, trip.id, &[2, 1])
        .await
        .unwrap();
    assert_eq!(booking.status, BookingStatus::Pending);
    assert_eq!(booking.payment_status, PaymentStatus::Pending);
    assert_eq!(booking.seat_numbers, vec![1, 2]);
    assert_eq!(booking.total_amount_cents, 3000);

    let availability = app.services().availability.get_availability(trip.id).await.unwrap();
    assert_eq!(availability.occupied, vec![1, 2]);
    assert!(availability.held.is_empty());
    assert!(
        app.services()
            .holds
            .list_user_holds(trip.id, alice)
            .await
            .unwrap()
            .is_empty()
    );
}

#[tokio::test]
async fn test_concurrent_bookings_of_one_seat() {
    let app = TestApp::new().await;
    let trip = app.add_trip(10, Duration::hours(5));
    let trip_id = trip.id;
    let bookings = Arc::clone(&app.services().bookings);

    let attempts = (0..8).map(|_| {
        let bookings = Arc::clone(&bookings);
        tokio::spawn(async move { bookings.create_booking(UserId::new(), trip_id, &[7]).await })
    });
    let results: Vec<_> = futures::future::join_all(attempts)
        .await
        .into_iter()
        .map(|joined| joined.unwrap())
        .collect();

    let won = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(won, 1);
    for err in results.iter().filter_map(|r| r.as_ref().err()) {
        assert_eq!(err.kind, ErrorKind::SeatNotAvailable);
    }
    assert_eq!(app.ledger.booking_count(), 1);
}

#[tokio::test]
async fn test_payment_result_drives_booking_status() {
    let app = TestApp::new().await;
    let trip = app.add_trip(10, Duration::hours(5));
    let user = UserId::new();
    let bookings = &app.services().bookings;

    let paid = bookings.create_booking(user, trip.id, &[1]).await.unwrap();
    let paid = bookings
        .update_booking_payment_status(paid.id, PaymentStatus::Completed)
        .await
        .unwrap();
    assert_eq!(paid.status, BookingStatus::Confirmed);

    let failed = bookings.create_booking(user, trip.id, &[2]).await.unwrap();
    let failed = bookings
        .update_booking_payment_status(failed.id, PaymentStatus::Failed)
        .await
        .unwrap();
    assert_eq!(failed.status, BookingStatus::Cancelled);

    // Seat 2 is free again, seat 1 stays taken.
    let availability = app.services().availability.get_availability(trip.id).await.unwrap();
    assert_eq!(availability.occupied, vec![1]);

    let err = bookings
        .update_booking_payment_status(failed.id, PaymentStatus::Completed)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvalidState);
}

#[tokio::test]
async fn test_out_of_range_and_duplicate_seats() {
    let app = TestApp::new().await;
    let trip = app.add_trip(4, Duration::hours(5));
    let user = UserId::new();

    let err = app
        .services()
        .bookings
        .create_booking(user, trip.id, &[5])
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Validation);

    let err = app
        .services()
        .holds
        .create_hold(trip.id, user, &[1, 1], None)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Validation);
}

#[tokio::test]
async fn test_expired_hold_frees_seats_and_is_swept() {
    let app = TestApp::new().await;
    let trip = app.add_trip(10, Duration::hours(5));

    app.services()
        .holds
        .create_hold(trip.id, UserId::new(), &[3], Some(StdDuration::from_secs(1)))
        .await
        .unwrap();
    tokio::time::sleep(StdDuration::from_millis(1100)).await;

    // Reads also drop lapsed holds, so sweep first to see the count.
    assert_eq!(app.services().holds.purge_expired().await.unwrap(), 1);
    assert_eq!(app.services().holds.purge_expired().await.unwrap(), 0);

    let availability = app.services().availability.get_availability(trip.id).await.unwrap();
    assert!(availability.held.is_empty());
    assert!(availability.available.contains(&3));
}

#[tokio::test]
async fn test_lapsed_hold_is_invisible_before_sweep() {
    let app = TestApp::new().await;
    let trip = app.add_trip(10, Duration::hours(5));

    app.services()
        .holds
        .create_hold(trip.id, UserId::new(), &[4], Some(StdDuration::from_secs(1)))
        .await
        .unwrap();
    tokio::time::sleep(StdDuration::from_millis(1100)).await;

    let availability = app.services().availability.get_availability(trip.id).await.unwrap();
    assert!(availability.held.is_empty());
    assert!(availability.available.contains(&4));

    app.services()
        .holds
        .create_hold(trip.id, UserId::new(), &[4], None)
        .await
        .unwrap();
}
