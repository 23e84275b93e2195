//! Integration tests for cancellation and pending expiry.

use chrono::{Duration, Utc};

use seatline_core::ErrorKind;
use seatline_core::types::UserId;
use seatline_entity::booking::{BookingStatus, PaymentStatus};

use crate::helpers::{TestApp, memory_config};

#[tokio::test]
async fn test_cancel_outside_window() {
    let app = TestApp::new().await;
    let trip = app.add_trip(20, Duration::hours(3));
    let user = UserId::new();
    let booking = app
        .services()
        .bookings
        .create_booking(user, trip.id, &[4, 5])
        .await
        .unwrap();

    let cancelled = app
        .services()
        .cancellation
        .cancel_booking(booking.id, user, Some("plans changed".to_string()))
        .await
        .unwrap();
    assert_eq!(cancelled.status, BookingStatus::Cancelled);
    assert_eq!(cancelled.cancellation_reason.as_deref(), Some("plans changed"));
    assert!(cancelled.cancelled_at.is_some());

    let availability = app.services().availability.get_availability(trip.id).await.unwrap();
    assert!(availability.occupied.is_empty());

    let err = app
        .services()
        .cancellation
        .cancel_booking(booking.id, user, None)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvalidState);
}

#[tokio::test]
async fn test_cancel_inside_window_is_refused() {
    let app = TestApp::new().await;
    let trip = app.add_trip(20, Duration::hours(1));
    let user = UserId::new();
    let booking = app
        .services()
        .bookings
        .create_booking(user, trip.id, &[1])
        .await
        .unwrap();

    let err = app
        .services()
        .cancellation
        .cancel_booking(booking.id, user, None)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotAvailable);

    let stored = app.services().bookings.get_booking(booking.id, user).await.unwrap();
    assert_eq!(stored.status, BookingStatus::Pending);
}

#[tokio::test]
async fn test_cancel_someone_elses_booking() {
    let app = TestApp::new().await;
    let trip = app.add_trip(20, Duration::hours(5));
    let booking = app
        .services()
        .bookings
        .create_booking(UserId::new(), trip.id, &[1])
        .await
        .unwrap();

    let err = app
        .services()
        .cancellation
        .cancel_booking(booking.id, UserId::new(), None)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);
}

#[tokio::test]
async fn test_confirmed_booking_can_be_refunded_after_cancel() {
    let app = TestApp::new().await;
    let trip = app.add_trip(20, Duration::hours(5));
    let user = UserId::new();
    let bookings = &app.services().bookings;
    let booking = bookings.create_booking(user, trip.id, &[9]).await.unwrap();
    bookings
        .update_booking_payment_status(booking.id, PaymentStatus::Completed)
        .await
        .unwrap();

    app.services()
        .cancellation
        .cancel_booking(booking.id, user, None)
        .await
        .unwrap();
    let refunded = bookings
        .update_booking_payment_status(booking.id, PaymentStatus::Refunded)
        .await
        .unwrap();
    assert_eq!(refunded.status, BookingStatus::Cancelled);
    assert_eq!(refunded.payment_status, PaymentStatus::Refunded);
}

#[tokio::test]
async fn test_unpaid_pending_bookings_expire() {
    let mut config = memory_config();
    config.booking.pending_grace_minutes = 15;
    let app = TestApp::with_config(config).await;
    let trip = app.add_trip(20, Duration::hours(5));
    let user = UserId::new();
    let bookings = &app.services().bookings;

    let unpaid = bookings.create_booking(user, trip.id, &[1]).await.unwrap();
    let paid = bookings.create_booking(user, trip.id, &[2]).await.unwrap();
    bookings
        .update_booking_payment_status(paid.id, PaymentStatus::Completed)
        .await
        .unwrap();

    let cancellation = &app.services().cancellation;
    assert_eq!(cancellation.expire_unpaid_pending(Utc::now()).await.unwrap(), 0);

    let later = Utc::now() + Duration::minutes(16);
    assert_eq!(cancellation.expire_unpaid_pending(later).await.unwrap(), 1);
    assert_eq!(cancellation.expire_unpaid_pending(later).await.unwrap(), 0);

    let expired = bookings.get_booking(unpaid.id, user).await.unwrap();
    assert_eq!(expired.status, BookingStatus::Cancelled);
    let kept = bookings.get_booking(paid.id, user).await.unwrap();
    assert_eq!(kept.status, BookingStatus::Confirmed);
}
