//! Shared test helpers for integration tests.

use std::sync::Arc;

use chrono::{Duration, Utc};

use seatline_api::{Runtime, assemble_with};
use seatline_core::config::AppConfig;
use seatline_core::types::{DriverId, TripId};
use seatline_database::MemoryLedger;
use seatline_entity::trip::{Trip, TripStatus};
use seatline_realtime::BroadcastHub;
use seatline_service::{Services, Stores};

/// Destination terminal used by every fixture trip.
pub const DEST_LAT: f64 = 10.3157;
pub const DEST_LON: f64 = 123.8854;

/// Test application context
pub struct TestApp {
    /// The assembled runtime (sweeps disabled)
    pub runtime: Runtime,
    /// The ledger behind every store
    pub ledger: Arc<MemoryLedger>,
}

/// In-process configuration with background sweeps off.
pub fn memory_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.database.provider = "memory".to_string();
    config.cache.provider = "memory".to_string();
    config.realtime.transport = "local".to_string();
    config.worker.enabled = false;
    config
}

impl TestApp {
    /// Create a new test application
    pub async fn new() -> Self {
        Self::with_config(memory_config()).await
    }

    /// Create a test application from `config`
    pub async fn with_config(config: AppConfig) -> Self {
        let ledger = Arc::new(MemoryLedger::new());
        let runtime = assemble_with(config, Stores::shared(ledger.clone()))
            .await
            .expect("Failed to assemble runtime");
        Self { runtime, ledger }
    }

    pub fn services(&self) -> &Services {
        &self.runtime.state.services
    }

    pub fn hub(&self) -> &Arc<BroadcastHub> {
        &self.runtime.state.hub
    }

    /// Add a SCHEDULED trip departing `departs_in` from now.
    pub fn add_trip(&self, capacity: i32, departs_in: Duration) -> Trip {
        let departure = Utc::now() + departs_in;
        let trip = Trip {
            id: TripId::new(),
            route_name: "Pier 1 - Lahug".to_string(),
            vehicle_capacity: capacity,
            departure_time: departure,
            arrival_time: departure + Duration::minutes(45),
            status: TripStatus::Scheduled,
            fare_cents: 1500,
            destination_latitude: DEST_LAT,
            destination_longitude: DEST_LON,
            driver_id: None,
            booked_seats: 0,
        };
        self.ledger.upsert_trip(trip.clone());
        trip
    }

    /// Add a trip already IN_TRANSIT with `driver_id` assigned.
    pub fn add_running_trip(&self, driver_id: DriverId) -> Trip {
        let mut trip = self.add_trip(20, Duration::minutes(-10));
        trip.status = TripStatus::InTransit;
        trip.driver_id = Some(driver_id);
        self.ledger.upsert_trip(trip.clone());
        trip
    }
}
