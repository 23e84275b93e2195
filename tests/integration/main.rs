//! End-to-end tests over an in-process runtime: holds, bookings,
//! cancellation, tracking, and socket fanout.

mod helpers;

mod booking_test;
mod cancellation_test;
mod realtime_test;
mod tracking_test;
