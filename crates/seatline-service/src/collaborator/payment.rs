//! Payment gateway port.

use async_trait::async_trait;
use tracing::info;

use seatline_core::result::AppResult;
use seatline_entity::booking::Booking;

/// Outbound calls to the payment provider.
///
/// Results come back asynchronously through
/// [`BookingService::update_booking_payment_status`](crate::booking::BookingService::update_booking_payment_status).
#[async_trait]
pub trait PaymentGateway: Send + Sync + std::fmt::Debug + 'static {
    /// Open a payment intent for a freshly created booking.
    async fn create_payment_intent(&self, booking: &Booking) -> AppResult<()>;

    /// Ask the provider to refund a captured payment.
    async fn request_refund(&self, booking: &Booking, reason: Option<&str>) -> AppResult<()>;
}

/// Gateway that only records requests in the log.
#[derive(Debug, Clone, Default)]
pub struct LoggingPaymentGateway;

#[async_trait]
impl PaymentGateway for LoggingPaymentGateway {
    async fn create_payment_intent(&self, booking: &Booking) -> AppResult<()> {
        info!(
            booking_id = %booking.id,
            reference = %booking.reference,
            amount_cents = booking.total_amount_cents,
            "Payment intent requested"
        );
        Ok(())
    }

    async fn request_refund(&self, booking: &Booking, reason: Option<&str>) -> AppResult<()> {
        info!(
            booking_id = %booking.id,
            reference = %booking.reference,
            amount_cents = booking.total_amount_cents,
            reason = reason.unwrap_or(""),
            "Refund requested"
        );
        Ok(())
    }
}
