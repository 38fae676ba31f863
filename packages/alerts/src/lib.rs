#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Proximity alerting for the safe-drive system.
//!
//! [`ProximityAlertManager`] re-evaluates every catalog segment on each
//! location sample, keeps the list of hazards currently within range, and
//! asks an [`safe_drive_ai::insight::InsightService`] for a safety briefing
//! the first time each hazard comes into range. Briefings are memoized in
//! an [`InsightCache`] for the rest of the session.
//!
//! [`monitor::watch`] wires a location subscription to a manager.

pub mod cache;
pub mod config;
pub mod manager;
pub mod monitor;

pub use cache::InsightCache;
pub use config::{AlertConfig, ConfigError};
pub use manager::{
    ActiveAlert, AlertEvent, INSIGHT_PLACEHOLDER, InsightRequest, LocationUpdateOutcome,
    ProximityAlertManager,
};
