//! Trip status enumeration and transition rules.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lifecycle status of a scheduled trip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "trip_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TripStatus {
    /// Published and open for booking.
    Scheduled,
    /// Passengers are boarding; still bookable.
    Boarding,
    /// Underway.
    InTransit,
    /// Reached the destination geofence.
    Arrived,
    /// Closed out by the driver.
    Completed,
    /// Called off before arrival.
    Cancelled,
}

impl TripStatus {
    /// Whether holds and bookings are accepted.
    pub fn is_bookable(&self) -> bool {
        matches!(self, Self::Scheduled | Self::Boarding)
    }

    /// Whether location fixes are accepted.
    pub fn accepts_location(&self) -> bool {
        matches!(self, Self::Boarding | Self::InTransit)
    }

    /// Whether the lifecycle allows moving from `self` to `next`.
    pub fn can_transition_to(&self, next: TripStatus) -> bool {
        use TripStatus::*;
        matches!(
            (self, next),
            (Scheduled, Boarding)
                | (Scheduled, Cancelled)
                | (Boarding, InTransit)
                | (Boarding, Cancelled)
                | (InTransit, Arrived)
                | (InTransit, Cancelled)
                | (Arrived, Completed)
        )
    }

    /// Return the status as its wire string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Scheduled => "SCHEDULED",
            Self::Boarding => "BOARDING",
            Self::InTransit => "IN_TRANSIT",
            Self::Arrived => "ARRIVED",
            Self::Completed => "COMPLETED",
            Self::Cancelled => "CANCELLED",
        }
    }
}

impl fmt::Display for TripStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for TripStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "SCHEDULED" => Ok(Self::Scheduled),
            "BOARDING" => Ok(Self::Boarding),
            "IN_TRANSIT" => Ok(Self::InTransit),
            "ARRIVED" => Ok(Self::Arrived),
            "COMPLETED" => Ok(Self::Completed),
            "CANCELLED" => Ok(Self::Cancelled),
            other => Err(format!("unknown trip status '{other}'")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transitions() {
        assert!(TripStatus::Scheduled.can_transition_to(TripStatus::Boarding));
        assert!(TripStatus::InTransit.can_transition_to(TripStatus::Arrived));
        assert!(!TripStatus::Arrived.can_transition_to(TripStatus::InTransit));
        assert!(!TripStatus::Completed.can_transition_to(TripStatus::Cancelled));
        assert!(!TripStatus::Scheduled.can_transition_to(TripStatus::Scheduled));
    }

    #[test]
    fn test_wire_format() {
        let json = serde_json::to_string(&TripStatus::InTransit).unwrap();
        assert_eq!(json, "\"IN_TRANSIT\"");
        assert_eq!("in_transit".parse::<TripStatus>().unwrap(), TripStatus::InTransit);
    }
}
