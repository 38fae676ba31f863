//! Compile-time registry of FRSC blackspot segments.
//!
//! Each entry is a `(name, toml_content)` pair embedded via `include_str!`.
//! Adding a segment requires creating a TOML file in `catalog/` and adding
//! a corresponding entry here.

use safe_drive_hazard_models::HazardSegment;

/// Number of registered segments. Enforced by a test.
#[cfg(test)]
const EXPECTED_SEGMENT_COUNT: usize = 4;

/// Embedded TOML segment definitions, in catalog order.
const SEGMENT_TOMLS: &[(&str, &str)] = &[
    ("long_bridge", include_str!("../catalog/long_bridge.toml")),
    (
        "third_mainland_bridge",
        include_str!("../catalog/third_mainland_bridge.toml"),
    ),
    ("ore_benin", include_str!("../catalog/ore_benin.toml")),
    (
        "gwagwalada_lokoja",
        include_str!("../catalog/gwagwalada_lokoja.toml"),
    ),
];

/// Returns all registered blackspot segments in catalog order.
///
/// # Panics
///
/// Panics if any embedded TOML file fails to parse. Since these are
/// compile-time constants, parse failures indicate a development error
/// and are caught by the tests below.
#[must_use]
pub fn all_segments() -> Vec<HazardSegment> {
    SEGMENT_TOMLS
        .iter()
        .map(|(name, toml_str)| {
            toml::de::from_str(toml_str)
                .unwrap_or_else(|e| panic!("Failed to parse hazard segment '{name}': {e}"))
        })
        .collect()
}
