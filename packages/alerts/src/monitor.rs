//! Drives a [`ProximityAlertManager`] from a location subscription.

use safe_drive_location::{LocationError, LocationEvent, LocationSubscription};
use tokio::sync::mpsc;

use crate::manager::{
    AlertEvent, InsightRequest, LocationUpdateOutcome, ProximityAlertManager,
};

/// Something that happened while watching, handed to the `on_update`
/// callback after the manager has processed it.
#[derive(Debug)]
pub enum MonitorUpdate<'a> {
    /// A sample was evaluated.
    Location(&'a LocationUpdateOutcome),
    /// An insight request settled.
    Insight(&'a AlertEvent),
    /// The location provider reported a failure.
    ProviderError(&'a LocationError),
}

/// Totals of a finished [`watch`] run.
#[derive(Debug, Default)]
pub struct WatchSummary {
    /// Samples evaluated.
    pub samples: usize,
    /// Provider failures seen.
    pub provider_errors: usize,
    /// Insight requests still running when the stream ended.
    pub pending_insights: Vec<InsightRequest>,
}

impl WatchSummary {
    /// Waits for the insight requests that outlived the stream.
    pub async fn wait_for_insights(&mut self) {
        let pending = LocationUpdateOutcome {
            alerts_replaced: false,
            insight_requests: std::mem::take(&mut self.pending_insights),
        };
        pending.wait_for_insights().await;
    }
}

/// Feeds every event of `subscription` to `manager`, serially, until the
/// provider finishes.
///
/// When `events` is given, settled insight requests are reported through
/// `on_update` as they arrive. Provider failures are logged via
/// [`ProximityAlertManager::on_provider_error`] and do not stop the loop.
pub async fn watch<F>(
    mut subscription: LocationSubscription,
    manager: &mut ProximityAlertManager,
    mut events: Option<mpsc::UnboundedReceiver<AlertEvent>>,
    mut on_update: F,
) -> WatchSummary
where
    F: FnMut(&ProximityAlertManager, MonitorUpdate<'_>),
{
    let mut summary = WatchSummary::default();

    loop {
        tokio::select! {
            event = subscription.next() => match event {
                Some(LocationEvent::Sample(sample)) => {
                    let mut outcome = manager.on_location_update(sample);
                    summary.samples += 1;
                    on_update(manager, MonitorUpdate::Location(&outcome));

                    summary.pending_insights.retain(|r| !r.handle.is_finished());
                    summary.pending_insights.append(&mut outcome.insight_requests);
                }
                Some(LocationEvent::Error(error)) => {
                    manager.on_provider_error(&error);
                    summary.provider_errors += 1;
                    on_update(manager, MonitorUpdate::ProviderError(&error));
                }
                None => break,
            },
            Some(event) = next_alert_event(&mut events) => {
                on_update(manager, MonitorUpdate::Insight(&event));
            }
        }
    }

    log::info!(
        "Location stream ended after {} samples ({} provider errors)",
        summary.samples,
        summary.provider_errors
    );
    summary
}

async fn next_alert_event(
    events: &mut Option<mpsc::UnboundedReceiver<AlertEvent>>,
) -> Option<AlertEvent> {
    match events {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use safe_drive_ai::AiError;
    use safe_drive_ai::insight::InsightService;
    use safe_drive_hazard::HazardCatalog;
    use safe_drive_hazard_models::HazardSegment;
    use safe_drive_location::LocationProvider;
    use safe_drive_location::manual::ManualLocationProvider;

    use super::*;
    use crate::AlertConfig;

    struct QuickInsights;

    #[async_trait::async_trait]
    impl InsightService for QuickInsights {
        async fn request_insight(&self, hazard: &HazardSegment) -> Result<String, AiError> {
            Ok(format!("Watch your speed on {}.", hazard.name))
        }
    }

    #[tokio::test]
    async fn processes_samples_and_errors_until_stream_ends() {
        let (provider, feed) = ManualLocationProvider::channel();
        let subscription = provider.subscribe().unwrap();
        let mut manager = ProximityAlertManager::new(
            Arc::new(HazardCatalog::embedded()),
            Arc::new(QuickInsights),
            AlertConfig::default(),
        );

        feed.push_position(12.0, 8.5).await.unwrap();
        feed.push_error("signal lost").await.unwrap();
        feed.push_position(6.6917, 3.4022).await.unwrap();
        drop(feed);

        let mut alert_counts = Vec::new();
        let mut summary = watch(subscription, &mut manager, None, |manager, update| {
            if let MonitorUpdate::Location(_) = update {
                alert_counts.push(manager.alerts().len());
            }
        })
        .await;

        assert_eq!(summary.samples, 2);
        assert_eq!(summary.provider_errors, 1);
        assert_eq!(alert_counts, [0, 1]);

        summary.wait_for_insights().await;
        assert!(summary.pending_insights.is_empty());
        assert!(manager.insight("lag-ib-1").is_some());
    }

    #[tokio::test]
    async fn reports_insight_events() {
        let (provider, feed) = ManualLocationProvider::channel();
        let subscription = provider.subscribe().unwrap();
        let mut manager = ProximityAlertManager::new(
            Arc::new(HazardCatalog::embedded()),
            Arc::new(QuickInsights),
            AlertConfig::default(),
        );
        let events = manager.subscribe_events();

        feed.push_position(6.6917, 3.4022).await.unwrap();

        let mut ready = Vec::new();
        let watcher = watch(subscription, &mut manager, Some(events), |_, update| {
            if let MonitorUpdate::Insight(AlertEvent::InsightReady { hazard_id }) = update {
                ready.push(hazard_id.clone());
            }
        });

        let feeder = async move {
            // Give the insight task a chance to settle before ending the stream.
            tokio::time::sleep(std::time::Duration::from_millis(50)).await;
            drop(feed);
        };

        let (summary, ()) = tokio::join!(watcher, feeder);
        assert_eq!(summary.samples, 1);
        assert_eq!(ready, ["lag-ib-1"]);
    }
}
