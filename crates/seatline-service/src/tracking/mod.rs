//! Location ingest and geofence detection.

pub mod geo;
pub mod service;

pub use geo::haversine_meters;
pub use service::{LocationUpdate, TrackingService};
