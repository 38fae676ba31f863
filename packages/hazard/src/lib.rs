#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Hazard catalog for the safe-drive system.
//!
//! The catalog is the fixed, read-only list of accident-prone road segments
//! the proximity alert manager checks every location sample against. It is
//! either the FRSC blackspot list embedded at compile time (see
//! [`registry`]) or an external TOML/JSON file supplied at startup via
//! `HAZARD_CATALOG_PATH` or the CLI.

pub mod registry;

use std::collections::BTreeSet;
use std::path::Path;

use safe_drive_hazard_models::HazardSegment;
use serde::Deserialize;
use thiserror::Error;

/// Environment variable naming an external catalog file.
pub const CATALOG_PATH_ENV: &str = "HAZARD_CATALOG_PATH";

/// Errors from loading or validating a hazard catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The catalog file could not be read.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The catalog file is not valid TOML.
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// The catalog file is not valid JSON.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Two segments share the same identifier.
    #[error("Duplicate hazard segment ID: {id}")]
    DuplicateId {
        /// The repeated identifier.
        id: String,
    },

    /// A segment has an empty identifier.
    #[error("Hazard segment '{name}' has an empty ID")]
    EmptyId {
        /// Name of the offending segment.
        name: String,
    },

    /// A segment's coordinates are outside the valid degree ranges.
    #[error("Hazard segment {id} has invalid coordinates ({latitude}, {longitude})")]
    InvalidCoordinates {
        /// The segment identifier.
        id: String,
        /// The offending latitude.
        latitude: f64,
        /// The offending longitude.
        longitude: f64,
    },
}

/// On-disk shape of an external catalog file.
#[derive(Debug, Deserialize)]
struct CatalogFile {
    #[serde(default)]
    segments: Vec<HazardSegment>,
}

/// An immutable, validated list of hazard segments in catalog order.
#[derive(Debug, Clone)]
pub struct HazardCatalog {
    segments: Vec<HazardSegment>,
}

impl HazardCatalog {
    /// Builds a catalog from segments, validating identifiers and
    /// coordinates.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError`] if an id is empty or repeated, or if any
    /// coordinates are out of range.
    pub fn new(segments: Vec<HazardSegment>) -> Result<Self, CatalogError> {
        let mut seen = BTreeSet::new();

        for segment in &segments {
            if segment.id.is_empty() {
                return Err(CatalogError::EmptyId {
                    name: segment.name.clone(),
                });
            }
            if !seen.insert(segment.id.as_str()) {
                return Err(CatalogError::DuplicateId {
                    id: segment.id.clone(),
                });
            }
            if !segment.coordinates.is_valid() {
                return Err(CatalogError::InvalidCoordinates {
                    id: segment.id.clone(),
                    latitude: segment.coordinates.latitude,
                    longitude: segment.coordinates.longitude,
                });
            }
        }

        Ok(Self { segments })
    }

    /// The FRSC blackspot catalog embedded in the binary.
    ///
    /// # Panics
    ///
    /// Panics if the embedded catalog is malformed, which the registry
    /// tests rule out.
    #[must_use]
    pub fn embedded() -> Self {
        Self::new(registry::all_segments())
            .unwrap_or_else(|e| panic!("Embedded hazard catalog is invalid: {e}"))
    }

    /// Loads a catalog from a TOML or JSON file (chosen by extension;
    /// anything other than `.json` is parsed as TOML).
    ///
    /// The file holds a `segments` array of hazard segment tables.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError`] if the file cannot be read, parsed, or
    /// fails validation.
    pub fn from_path(path: &Path) -> Result<Self, CatalogError> {
        let contents = std::fs::read_to_string(path)?;

        let is_json = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

        let file: CatalogFile = if is_json {
            serde_json::from_str(&contents)?
        } else {
            toml::de::from_str(&contents)?
        };

        let catalog = Self::new(file.segments)?;
        log::info!(
            "Loaded {} hazard segments from {}",
            catalog.len(),
            path.display()
        );
        Ok(catalog)
    }

    /// Loads the catalog named by `HAZARD_CATALOG_PATH`, falling back to the
    /// embedded catalog when the variable is unset.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError`] if the variable is set but the file cannot
    /// be loaded.
    pub fn from_env() -> Result<Self, CatalogError> {
        match std::env::var(CATALOG_PATH_ENV) {
            Ok(path) if !path.trim().is_empty() => Self::from_path(Path::new(path.trim())),
            _ => {
                log::debug!("{CATALOG_PATH_ENV} not set; using embedded FRSC catalog");
                Ok(Self::embedded())
            }
        }
    }

    /// Looks up a segment by id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&HazardSegment> {
        self.segments.iter().find(|s| s.id == id)
    }

    /// Iterates segments in catalog order.
    pub fn iter(&self) -> std::slice::Iter<'_, HazardSegment> {
        self.segments.iter()
    }

    /// All segments in catalog order.
    #[must_use]
    pub fn segments(&self) -> &[HazardSegment] {
        &self.segments
    }

    /// Number of segments.
    #[must_use]
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Whether the catalog has no segments.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

impl<'a> IntoIterator for &'a HazardCatalog {
    type Item = &'a HazardSegment;
    type IntoIter = std::slice::Iter<'a, HazardSegment>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
