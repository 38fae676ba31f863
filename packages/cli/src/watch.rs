//! Live hazard monitoring.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use safe_drive_alerts::monitor::{self, MonitorUpdate};
use safe_drive_alerts::{AlertEvent, ProximityAlertManager};
use safe_drive_hazard_models::GeoPoint;
use safe_drive_location::manual::ManualLocationProvider;
use safe_drive_location::replay::TrackReplayProvider;
use safe_drive_location::{LocationProvider, LocationSubscription};

use crate::{dashboard, setup};

/// Where location samples come from.
#[derive(Debug, Clone)]
pub enum LocationSource {
    /// A recorded CSV track.
    Track(PathBuf),
    /// A single fixed position.
    Position(GeoPoint),
}

/// Settings for one monitoring run.
#[derive(Debug, Clone)]
pub struct WatchOptions {
    pub source: LocationSource,
    pub interval: Duration,
    pub threshold_km: Option<f64>,
    pub catalog: Option<PathBuf>,
    pub dedupe: bool,
}

async fn subscribe(options: &WatchOptions) -> Result<LocationSubscription, Box<dyn std::error::Error>> {
    match &options.source {
        LocationSource::Track(path) => {
            let provider = TrackReplayProvider::from_csv_path(path, options.interval)?;
            log::info!(
                "Replaying {} track points from {}",
                provider.points().len(),
                path.display()
            );
            Ok(provider.subscribe()?)
        }
        LocationSource::Position(point) => {
            let (provider, feed) = ManualLocationProvider::channel();
            let subscription = provider.subscribe()?;
            feed.push_position(point.latitude, point.longitude).await?;
            Ok(subscription)
        }
    }
}

/// Runs the dashboard until the location stream ends, then waits for
/// outstanding insights and prints the final state.
///
/// # Errors
///
/// Returns an error if the catalog, configuration, or location source
/// cannot be loaded.
pub async fn run(options: &WatchOptions) -> Result<(), Box<dyn std::error::Error>> {
    let catalog = Arc::new(setup::load_catalog(options.catalog.as_deref())?);
    let config = setup::alert_config(options.threshold_km, options.dedupe)?;
    let services = setup::AiServices::from_env();

    log::info!(
        "Monitoring {} hazard segments within {} km",
        catalog.len(),
        config.threshold_km
    );

    let mut manager = ProximityAlertManager::new(catalog, services.insight, config);
    let events = manager.subscribe_events();
    let subscription = subscribe(options).await?;

    let mut summary = monitor::watch(subscription, &mut manager, Some(events), |manager, update| {
        match update {
            MonitorUpdate::Location(outcome) if outcome.alerts_replaced => {
                println!("{}", dashboard::render(manager));
            }
            MonitorUpdate::Location(_) => {
                println!("{}", dashboard::render_telemetry(manager.last_sample()));
            }
            MonitorUpdate::Insight(AlertEvent::InsightReady { hazard_id }) => {
                if manager.alerts().iter().any(|a| &a.hazard_id == hazard_id) {
                    println!("{}", dashboard::render(manager));
                }
            }
            MonitorUpdate::Insight(AlertEvent::InsightFailed { .. }) => {}
            MonitorUpdate::ProviderError(error) => {
                println!("GPS unavailable: {error}");
            }
        }
    })
    .await;

    summary.wait_for_insights().await;
    println!("{}", dashboard::render(&manager));
    println!(
        "Processed {} samples ({} GPS errors)",
        summary.samples, summary.provider_errors
    );

    Ok(())
}
