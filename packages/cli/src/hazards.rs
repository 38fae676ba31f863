//! Hazard list and distance tables.

use std::fmt::Write as _;

use safe_drive_alerts::AlertConfig;
use safe_drive_hazard::HazardCatalog;
use safe_drive_hazard_models::{GeoPoint, HazardSegment, RiskLevel};
use safe_drive_spatial::{distance_km, round_to_tenth};

/// Table of catalog segments, optionally filtered by risk level.
#[must_use]
pub fn render_list(catalog: &HazardCatalog, risk: Option<RiskLevel>) -> String {
    let segments: Vec<&HazardSegment> = catalog
        .iter()
        .filter(|s| risk.is_none_or(|r| s.risk_level == r))
        .collect();

    let mut output = String::new();
    let _ = writeln!(
        output,
        "{:<12} {:<7} {:>9} {:<20} NAME",
        "ID", "RISK", "ACCIDENTS", "COORDINATES"
    );
    let _ = writeln!(output, "{}", "-".repeat(80));
    for s in &segments {
        let _ = writeln!(
            output,
            "{:<12} {:<7} {:>9} {:<20} {}",
            s.id,
            s.risk_level,
            s.recent_accident_count,
            s.coordinates.to_string(),
            s.name
        );
    }
    let _ = write!(output, "{} segment(s)", segments.len());
    output
}

/// Full details of one segment.
#[must_use]
pub fn render_detail(segment: &HazardSegment) -> String {
    let mut output = String::new();
    let _ = writeln!(output, "{} [{}]", segment.name, segment.id);
    let _ = writeln!(output, "  Location:  {}", segment.location);
    let _ = writeln!(output, "  Position:  {}", segment.coordinates);
    let _ = writeln!(output, "  Risk:      {}", segment.risk_level);
    let _ = writeln!(output, "  Accidents: {} recent", segment.recent_accident_count);
    let _ = writeln!(output, "  Causes:    {}", segment.common_causes.join(", "));
    let _ = write!(output, "  {}", segment.description);
    output
}

/// Every segment with its distance from `from`, nearest first, marking
/// those within the alert radius.
#[must_use]
pub fn render_distances(catalog: &HazardCatalog, from: GeoPoint, config: &AlertConfig) -> String {
    let mut rows: Vec<(&HazardSegment, f64)> = catalog
        .iter()
        .map(|s| (s, distance_km(from, s.coordinates)))
        .collect();
    rows.sort_by(|a, b| a.1.total_cmp(&b.1));

    let mut output = String::new();
    let _ = writeln!(output, "Distances from {from}:");
    for (segment, km) in rows {
        let marker = if config.in_range(km) { "IN RANGE" } else { "" };
        let _ = writeln!(
            output,
            "  {:>8.1} km  {:<12} {:<40} {marker}",
            round_to_tenth(km),
            segment.id,
            segment.name
        );
    }
    output.truncate(output.trim_end().len());
    output
}
