//! Location ingest, latest-location cache, and geofence arrival.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use validator::Validate;

use seatline_cache::CacheManager;
use seatline_cache::keys;
use seatline_core::config::TrackingConfig;
use seatline_core::error::AppError;
use seatline_core::result::AppResult;
use seatline_core::traits::CacheProviderExt;
use seatline_core::types::TripId;
use seatline_database::store::{LocationStore, TripStore};
use seatline_entity::event::{DomainEvent, TripEvent};
use seatline_entity::location::{NewTripLocation, TripLocation};
use seatline_entity::trip::TripStatus;

use super::geo::haversine_meters;
use crate::collaborator::Collaborators;
use crate::trip::TripService;

/// A GPS fix reported by a driver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct LocationUpdate {
    /// The tracked trip.
    pub trip_id: TripId,
    /// Latitude in degrees.
    #[validate(range(min = -90.0, max = 90.0))]
    pub latitude: f64,
    /// Longitude in degrees.
    #[validate(range(min = -180.0, max = 180.0))]
    pub longitude: f64,
    /// Ground speed in km/h.
    #[validate(range(min = 0.0))]
    pub speed: Option<f64>,
    /// Heading in degrees from north.
    #[validate(range(min = 0.0, max = 360.0))]
    pub heading: Option<f64>,
}

impl LocationUpdate {
    /// A fix without speed or heading.
    pub fn at(trip_id: TripId, latitude: f64, longitude: f64) -> Self {
        Self {
            trip_id,
            latitude,
            longitude,
            speed: None,
            heading: None,
        }
    }

    fn check(&self) -> AppResult<()> {
        let finite = [Some(self.latitude), Some(self.longitude), self.speed, self.heading]
            .into_iter()
            .flatten()
            .all(f64::is_finite);
        if !finite {
            return Err(AppError::validation("Coordinates must be finite numbers"));
        }
        self.validate()?;
        Ok(())
    }
}

/// Accepts location fixes for moving trips and detects arrival.
#[derive(Debug, Clone)]
pub struct TrackingService {
    /// Trip reads.
    trips: Arc<dyn TripStore>,
    /// Location history.
    locations: Arc<dyn LocationStore>,
    /// Latest-location cache.
    cache: CacheManager,
    /// Arrival transition.
    trip_service: Arc<TripService>,
    /// Event fanout.
    collaborators: Collaborators,
    /// Geofence and cache settings.
    config: TrackingConfig,
}

impl TrackingService {
    /// Creates a new tracking service.
    pub fn new(
        trips: Arc<dyn TripStore>,
        locations: Arc<dyn LocationStore>,
        cache: CacheManager,
        trip_service: Arc<TripService>,
        collaborators: Collaborators,
        config: TrackingConfig,
    ) -> Self {
        Self {
            trips,
            locations,
            cache,
            trip_service,
            collaborators,
            config,
        }
    }

    /// Record a fix for a BOARDING or IN_TRANSIT trip.
    ///
    /// The fix is appended to history, cached as the current location, and
    /// published. Inside the destination geofence an IN_TRANSIT trip moves to
    /// ARRIVED; only the update that wins that transition emits the arrival.
    pub async fn update_trip_location(&self, update: LocationUpdate) -> AppResult<TripLocation> {
        update.check()?;
        let trip_id = update.trip_id;
        let trip = self
            .trips
            .find_trip(trip_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Trip {trip_id} not found")))?;
        if !trip.status.accepts_location() {
            return Err(AppError::invalid_state(format!(
                "Trip {trip_id} is {} and does not accept locations",
                trip.status
            )));
        }

        let location = self
            .locations
            .append_location(NewTripLocation {
                trip_id,
                latitude: update.latitude,
                longitude: update.longitude,
                speed: update.speed,
                heading: update.heading,
                recorded_at: Utc::now(),
            })
            .await?;
        self.warm_cache(&location).await;

        self.collaborators
            .events
            .publish(DomainEvent::Trip(TripEvent::LocationUpdated {
                location: location.clone(),
            }))
            .await;

        let distance = haversine_meters(
            location.latitude,
            location.longitude,
            trip.destination_latitude,
            trip.destination_longitude,
        );
        debug!(trip_id = %trip_id, distance_m = distance, "Location accepted");

        if trip.status == TripStatus::InTransit && distance <= self.config.geofence_radius_meters {
            let arrived_at = location.recorded_at;
            if self
                .trip_service
                .apply(&trip, TripStatus::Arrived, None, arrived_at)
                .await?
                .is_some()
            {
                info!(trip_id = %trip_id, distance_m = distance, "Trip arrived at destination");
                self.collaborators
                    .events
                    .publish(DomainEvent::Trip(TripEvent::Arrived {
                        trip_id,
                        distance_meters: distance,
                        arrived_at,
                    }))
                    .await;
            }
        }

        Ok(location)
    }

    /// The newest fix: cache first, then history (which re-warms the cache).
    pub async fn get_current_location(&self, trip_id: TripId) -> AppResult<Option<TripLocation>> {
        let key = keys::trip_location(trip_id);
        match self.cache.get_json::<TripLocation>(&key).await {
            Ok(Some(location)) => return Ok(Some(location)),
            Ok(None) => {}
            Err(e) => warn!(trip_id = %trip_id, error = %e, "Location cache read failed"),
        }

        let latest = self.locations.latest_location(trip_id).await?;
        if let Some(location) = &latest {
            self.warm_cache(location).await;
        }
        Ok(latest)
    }

    /// Most recent fixes first. `limit` is clamped to `1..=history_limit_max`.
    pub async fn get_location_history(
        &self,
        trip_id: TripId,
        limit: u32,
    ) -> AppResult<Vec<TripLocation>> {
        let limit = limit.clamp(1, self.config.history_limit_max);
        self.locations.location_history(trip_id, limit).await
    }

    /// Delete fixes older than the retention window. Returns the count.
    pub async fn prune_history(&self) -> AppResult<u64> {
        let cutoff = Utc::now() - chrono::Duration::days(self.config.retention_days);
        self.locations.prune_locations_before(cutoff).await
    }

    async fn warm_cache(&self, location: &TripLocation) {
        let key = keys::trip_location(location.trip_id);
        let ttl = Duration::from_secs(self.config.location_cache_ttl_seconds);
        if let Err(e) = self.cache.set_json(&key, location, ttl).await {
            warn!(trip_id = %location.trip_id, error = %e, "Location cache write failed");
        }
    }
}
