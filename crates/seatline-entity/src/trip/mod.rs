//! Trip read model and status lifecycle.

pub mod model;
pub mod status;

pub use model::Trip;
pub use status::TripStatus;
