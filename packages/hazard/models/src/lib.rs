#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Road hazard, location sample, and alert types.
//!
//! This crate defines the plain data shared across the safe-drive system:
//! the hazardous road segments from the FRSC blackspot catalog, the position
//! samples produced by a location provider, and the proximity alerts raised
//! when a driver comes within range of a segment.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Conversion factor from metres per second to kilometres per hour.
const MPS_TO_KMH: f64 = 3.6;

/// A point on the Earth's surface in WGS84 degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeoPoint {
    /// Latitude in degrees (-90 to 90).
    #[serde(alias = "lat")]
    pub latitude: f64,
    /// Longitude in degrees (-180 to 180).
    #[serde(alias = "lng", alias = "lon")]
    pub longitude: f64,
}

impl GeoPoint {
    /// Creates a new point from latitude and longitude in degrees.
    #[must_use]
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Whether both components are finite and inside the valid degree
    /// ranges.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }
}

impl std::fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.4}, {:.4}", self.latitude, self.longitude)
    }
}

/// Risk classification of a hazardous road segment.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
pub enum RiskLevel {
    /// Frequent serious crashes.
    High,
    /// Recurring incidents.
    Medium,
    /// Occasional incidents.
    Low,
}

/// A named stretch of road flagged as accident-prone.
///
/// Segments come from a static catalog and are never mutated; identity is
/// the [`id`](Self::id).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HazardSegment {
    /// Unique identifier (e.g. `"lag-ib-1"`).
    pub id: String,
    /// Human-readable road name.
    pub name: String,
    /// Location label (e.g. `"Warewa/Ibafo Axis"`).
    pub location: String,
    /// Representative coordinates of the segment.
    pub coordinates: GeoPoint,
    /// Risk classification.
    #[serde(alias = "risk_level")]
    pub risk_level: RiskLevel,
    /// Short description of the hazard.
    pub description: String,
    /// Number of recently recorded accidents.
    #[serde(alias = "recentAccidents", alias = "recent_accident_count")]
    pub recent_accident_count: u32,
    /// Most common crash causes, in order of prevalence.
    #[serde(default, alias = "common_causes")]
    pub common_causes: Vec<String>,
}

/// A raw position fix as reported by a location provider.
///
/// Speed is in metres per second, the unit used by GPS receivers and the
/// browser geolocation API.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RawFix {
    /// Latitude in degrees.
    pub latitude: f64,
    /// Longitude in degrees.
    pub longitude: f64,
    /// Ground speed in metres per second.
    #[serde(default)]
    pub speed_mps: Option<f64>,
    /// Heading in degrees clockwise from true north.
    #[serde(default)]
    pub heading: Option<f64>,
    /// Horizontal accuracy in metres.
    #[serde(default)]
    pub accuracy: Option<f64>,
}

/// A location sample consumed by the proximity alert manager.
///
/// Each sample supersedes the previous one; no history is retained.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationSample {
    /// Position of the vehicle.
    pub coordinates: GeoPoint,
    /// Ground speed in km/h.
    pub speed_kmh: Option<f64>,
    /// Heading in degrees.
    pub heading_degrees: Option<f64>,
    /// Horizontal accuracy in metres.
    pub accuracy_meters: Option<f64>,
}

impl LocationSample {
    /// Creates a sample carrying only a position.
    #[must_use]
    pub const fn at(coordinates: GeoPoint) -> Self {
        Self {
            coordinates,
            speed_kmh: None,
            heading_degrees: None,
            accuracy_meters: None,
        }
    }

    /// Converts a raw provider fix into a sample.
    ///
    /// Speed is converted from m/s to km/h and rounded to the nearest whole
    /// number for display.
    #[must_use]
    pub fn from_raw_fix(fix: RawFix) -> Self {
        Self {
            coordinates: GeoPoint::new(fix.latitude, fix.longitude),
            speed_kmh: fix.speed_mps.map(|mps| (mps * MPS_TO_KMH).round()),
            heading_degrees: fix.heading,
            accuracy_meters: fix.accuracy,
        }
    }
}

impl From<RawFix> for LocationSample {
    fn from(fix: RawFix) -> Self {
        Self::from_raw_fix(fix)
    }
}

/// A proximity alert raised for one hazard on one evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    /// Unique identifier generated per evaluation.
    pub id: String,
    /// When the alert was raised.
    pub created_at: DateTime<Utc>,
    /// The [`HazardSegment::id`] this alert refers to.
    pub hazard_id: String,
    /// Distance to the hazard in km, rounded to 0.1.
    pub distance_km: f64,
    /// Whether the alert is currently active.
    pub active: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn risk_level_display_matches_catalog_spelling() {
        assert_eq!(RiskLevel::High.to_string(), "High");
        assert_eq!("Medium".parse::<RiskLevel>().unwrap(), RiskLevel::Medium);
        assert!("Severe".parse::<RiskLevel>().is_err());
    }

    #[test]
    fn raw_fix_speed_converted_to_kmh() {
        let sample = LocationSample::from_raw_fix(RawFix {
            latitude: 6.5,
            longitude: 3.4,
            speed_mps: Some(25.0),
            heading: Some(90.0),
            accuracy: Some(5.0),
        });
        assert!((sample.speed_kmh.unwrap() - 90.0).abs() < f64::EPSILON);
        assert_eq!(sample.heading_degrees, Some(90.0));
        assert_eq!(sample.coordinates, GeoPoint::new(6.5, 3.4));
    }

    #[test]
    fn raw_fix_without_speed_stays_absent() {
        let sample: LocationSample = RawFix {
            latitude: 0.0,
            longitude: 0.0,
            speed_mps: None,
            heading: None,
            accuracy: None,
        }
        .into();
        assert!(sample.speed_kmh.is_none());
    }

    #[test]
    fn geo_point_accepts_short_keys() {
        let point: GeoPoint = serde_json::from_str(r#"{"lat": 6.6917, "lng": 3.4022}"#).unwrap();
        assert_eq!(point, GeoPoint::new(6.6917, 3.4022));
    }

    #[test]
    fn geo_point_validity() {
        assert!(GeoPoint::new(6.69, 3.40).is_valid());
        assert!(!GeoPoint::new(91.0, 0.0).is_valid());
        assert!(!GeoPoint::new(0.0, f64::NAN).is_valid());
    }
}
