//! PostgreSQL implementations of the store traits.

pub mod booking;
pub mod location;
pub mod trip;

pub use booking::BookingRepository;
pub use location::LocationRepository;
pub use trip::TripRepository;
