//! Plain-text rendering of the driving dashboard.

use std::fmt::Write as _;

use safe_drive_alerts::{ActiveAlert, ProximityAlertManager};
use safe_drive_hazard_models::LocationSample;

/// Standing advice printed under the alerts.
pub const SAFETY_TIPS: &[&str] = &[
    "Night travel is discouraged on the Gwagwalada-Lokoja axis due to poor illumination.",
    "Ensure tyre pressure checks before traversing the Long Bridge heat zone.",
];

/// Speed and position line. Speed shows 0 until the provider reports one.
#[must_use]
pub fn render_telemetry(sample: Option<&LocationSample>) -> String {
    let Some(sample) = sample else {
        return "Waiting for GPS fix...".to_string();
    };

    let mut line = format!(
        "{:>3.0} km/h | {}",
        sample.speed_kmh.unwrap_or(0.0),
        sample.coordinates
    );
    if let Some(heading) = sample.heading_degrees {
        let _ = write!(line, " | heading {heading:.0}°");
    }
    if let Some(accuracy) = sample.accuracy_meters {
        let _ = write!(line, " | ±{accuracy:.0} m");
    }
    line
}

/// The alert cards, or the all-clear notice when nothing is in range.
#[must_use]
pub fn render_alerts(alerts: &[ActiveAlert], threshold_km: f64) -> String {
    if alerts.is_empty() {
        return format!(
            "ALL CLEAR\nNo reported dangerous zones within {threshold_km}km of your current position."
        );
    }

    let mut output = String::from("NEARBY DANGEROUS SEGMENTS\n");
    for active in alerts {
        let _ = writeln!(output, "! {}", active.hazard.name);
        let _ = writeln!(
            output,
            "  {:.1} km away • {} Risk • {}",
            active.alert.distance_km, active.hazard.risk_level, active.hazard.location
        );
        let _ = writeln!(output, "  AI Safety Insight: {}", active.insight_or_placeholder());
    }
    output.truncate(output.trim_end().len());
    output
}

/// The full dashboard for the manager's current state.
#[must_use]
pub fn render(manager: &ProximityAlertManager) -> String {
    let alerts = manager.active_alerts();

    let mut output = String::new();
    let _ = writeln!(output, "=== NaijaSafeDrive ===");
    let _ = writeln!(output, "{}", render_telemetry(manager.last_sample()));
    let _ = writeln!(output, "Active Alerts: {}", alerts.len());
    let _ = writeln!(output);
    let _ = writeln!(
        output,
        "{}",
        render_alerts(&alerts, manager.config().threshold_km)
    );
    let _ = writeln!(output);
    let _ = writeln!(output, "FRSC Safe Commute Tips");
    for tip in SAFETY_TIPS {
        let _ = writeln!(output, "  - {tip}");
    }
    output
}
