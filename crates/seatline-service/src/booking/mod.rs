//! Booking transaction management.

pub mod pricing;
pub mod reference;
pub mod service;

pub use pricing::{FlatFare, PricingStrategy};
pub use reference::ReferenceGenerator;
pub use service::BookingService;
