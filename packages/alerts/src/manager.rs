//! The proximity alert manager.
//!
//! Every location sample triggers a full pass over the catalog. Hazards at
//! or within the configured radius become [`Alert`]s; the stored alert list
//! is replaced wholesale, except that an empty result never replaces an
//! already-empty list. In-range hazards with no cached insight get an
//! insight request spawned onto the tokio runtime. A failed request leaves
//! the cache untouched, so the next in-range evaluation asks again.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use safe_drive_ai::insight::InsightService;
use safe_drive_hazard::HazardCatalog;
use safe_drive_hazard_models::{Alert, HazardSegment, LocationSample};
use safe_drive_location::LocationError;
use safe_drive_spatial::{distance_km, round_to_tenth};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::{AlertConfig, InsightCache};

/// Text shown for an in-range hazard whose insight has not arrived.
pub const INSIGHT_PLACEHOLDER: &str = "Analyzing local road factors...";

/// Notification emitted when an insight request settles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AlertEvent {
    /// The insight for `hazard_id` is now cached.
    InsightReady {
        /// The hazard the insight describes.
        hazard_id: String,
    },
    /// The insight request for `hazard_id` failed; it will be retried on
    /// the next in-range evaluation.
    InsightFailed {
        /// The hazard the request was for.
        hazard_id: String,
        /// Why the request failed.
        message: String,
    },
}

/// A spawned insight request.
#[derive(Debug)]
pub struct InsightRequest {
    /// The hazard being described.
    pub hazard_id: String,
    /// The task running the request.
    pub handle: JoinHandle<()>,
}

/// What a call to [`ProximityAlertManager::on_location_update`] did.
#[derive(Debug, Default)]
pub struct LocationUpdateOutcome {
    /// Whether the stored alert list was replaced.
    pub alerts_replaced: bool,
    /// Insight requests issued by this evaluation, in catalog order.
    pub insight_requests: Vec<InsightRequest>,
}

impl LocationUpdateOutcome {
    /// Waits until every insight request issued by this evaluation has
    /// settled.
    pub async fn wait_for_insights(self) {
        for request in self.insight_requests {
            if let Err(e) = request.handle.await {
                log::error!(
                    "Insight task for {} did not complete: {e}",
                    request.hazard_id
                );
            }
        }
    }
}

/// An alert joined with its hazard and current insight.
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveAlert {
    /// Distance-annotated alert for the hazard.
    pub alert: Alert,
    /// The catalog segment the alert refers to.
    pub hazard: HazardSegment,
    /// Cached insight, absent until a request succeeds.
    pub insight: Option<String>,
}

impl ActiveAlert {
    /// The insight text, or [`INSIGHT_PLACEHOLDER`] while it is pending.
    #[must_use]
    pub fn insight_or_placeholder(&self) -> &str {
        self.insight.as_deref().unwrap_or(INSIGHT_PLACEHOLDER)
    }
}

/// Tracks which catalog hazards are near the driver.
pub struct ProximityAlertManager {
    catalog: Arc<HazardCatalog>,
    config: AlertConfig,
    insight_service: Arc<dyn InsightService>,
    cache: InsightCache,
    in_flight: Arc<Mutex<BTreeSet<String>>>,
    events: Option<mpsc::UnboundedSender<AlertEvent>>,
    alerts: Vec<Alert>,
    revision: u64,
    last_sample: Option<LocationSample>,
}

impl ProximityAlertManager {
    #[must_use]
    pub fn new(
        catalog: Arc<HazardCatalog>,
        insight_service: Arc<dyn InsightService>,
        config: AlertConfig,
    ) -> Self {
        Self {
            catalog,
            config,
            insight_service,
            cache: InsightCache::new(),
            in_flight: Arc::new(Mutex::new(BTreeSet::new())),
            events: None,
            alerts: Vec::new(),
            revision: 0,
            last_sample: None,
        }
    }

    /// Returns a receiver of [`AlertEvent`]s. Calling it again replaces the
    /// previous receiver.
    pub fn subscribe_events(&mut self) -> mpsc::UnboundedReceiver<AlertEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.events = Some(tx);
        rx
    }

    /// Re-evaluates every catalog hazard against `sample`.
    ///
    /// Coordinates are not range-checked; out-of-range input simply yields
    /// meaningless distances. Insight requests are spawned onto the current
    /// tokio runtime. Outside a runtime they are skipped and logged, and
    /// will be retried on the next in-range evaluation.
    pub fn on_location_update(&mut self, sample: LocationSample) -> LocationUpdateOutcome {
        let catalog = Arc::clone(&self.catalog);
        let origin = sample.coordinates;

        let in_range: Vec<(&HazardSegment, f64)> = catalog
            .iter()
            .filter_map(|hazard| {
                let distance = distance_km(origin, hazard.coordinates);
                self.config.in_range(distance).then_some((hazard, distance))
            })
            .collect();

        let created_at = Utc::now();
        let new_alerts: Vec<Alert> = in_range
            .iter()
            .map(|(hazard, distance)| Alert {
                id: Uuid::new_v4().to_string(),
                created_at,
                hazard_id: hazard.id.clone(),
                distance_km: round_to_tenth(*distance),
                active: true,
            })
            .collect();

        let alerts_replaced = !(new_alerts.is_empty() && self.alerts.is_empty());
        if alerts_replaced {
            log::debug!(
                "Alert list replaced at {origin}: {} -> {} alerts",
                self.alerts.len(),
                new_alerts.len()
            );
            self.alerts = new_alerts;
            self.revision += 1;
        }
        self.last_sample = Some(sample);

        let insight_requests = in_range
            .iter()
            .filter(|(hazard, _)| !self.cache.contains(&hazard.id))
            .filter_map(|(hazard, _)| self.request_insight(hazard))
            .collect();

        LocationUpdateOutcome {
            alerts_replaced,
            insight_requests,
        }
    }

    /// Records a location provider failure. State is left untouched.
    pub fn on_provider_error(&self, error: &LocationError) {
        log::warn!("Location provider error: {error}");
    }

    fn lock_in_flight(&self) -> MutexGuard<'_, BTreeSet<String>> {
        self.in_flight.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn request_insight(&self, hazard: &HazardSegment) -> Option<InsightRequest> {
        let dedupe = self.config.dedupe_in_flight_insights;
        if dedupe && !self.lock_in_flight().insert(hazard.id.clone()) {
            log::debug!("Insight for {} already in flight", hazard.id);
            return None;
        }

        let runtime = match tokio::runtime::Handle::try_current() {
            Ok(runtime) => runtime,
            Err(e) => {
                log::error!("Cannot request insight for {}: {e}", hazard.id);
                if dedupe {
                    self.lock_in_flight().remove(&hazard.id);
                }
                return None;
            }
        };

        log::info!("Requesting insight for {} ({})", hazard.id, hazard.name);

        let service = Arc::clone(&self.insight_service);
        let cache = self.cache.clone();
        let events = self.events.clone();
        let in_flight = dedupe.then(|| Arc::clone(&self.in_flight));
        let hazard = hazard.clone();
        let hazard_id = hazard.id.clone();

        let handle = runtime.spawn(async move {
            let result = service.request_insight(&hazard).await;

            let event = match result {
                Ok(text) => {
                    log::info!("Insight ready for {}", hazard.id);
                    cache.insert(hazard.id.clone(), text);
                    AlertEvent::InsightReady {
                        hazard_id: hazard.id.clone(),
                    }
                }
                Err(e) => {
                    log::warn!("Insight request for {} failed: {e}", hazard.id);
                    AlertEvent::InsightFailed {
                        hazard_id: hazard.id.clone(),
                        message: e.to_string(),
                    }
                }
            };

            // Released only after the cache write so a concurrent pass
            // cannot slip a duplicate request in between.
            if let Some(in_flight) = in_flight {
                in_flight
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .remove(&hazard.id);
            }

            if let Some(events) = events
                && events.send(event).is_err()
            {
                log::trace!("Alert event receiver dropped");
            }
        });

        Some(InsightRequest { hazard_id, handle })
    }

    /// The current alert list, in catalog order.
    #[must_use]
    pub fn alerts(&self) -> &[Alert] {
        &self.alerts
    }

    /// Incremented every time the alert list is replaced.
    #[must_use]
    pub const fn alerts_revision(&self) -> u64 {
        self.revision
    }

    /// The most recent sample passed to
    /// [`on_location_update`](Self::on_location_update).
    #[must_use]
    pub const fn last_sample(&self) -> Option<&LocationSample> {
        self.last_sample.as_ref()
    }

    /// Current alerts joined with their hazard and insight.
    #[must_use]
    pub fn active_alerts(&self) -> Vec<ActiveAlert> {
        self.alerts
            .iter()
            .filter_map(|alert| {
                let hazard = self.catalog.get(&alert.hazard_id)?;
                Some(ActiveAlert {
                    alert: alert.clone(),
                    hazard: hazard.clone(),
                    insight: self.cache.get(&alert.hazard_id),
                })
            })
            .collect()
    }

    /// The cached insight for `hazard_id`.
    #[must_use]
    pub fn insight(&self, hazard_id: &str) -> Option<String> {
        self.cache.get(hazard_id)
    }

    /// The cached insight for `hazard_id`, or [`INSIGHT_PLACEHOLDER`].
    #[must_use]
    pub fn insight_or_placeholder(&self, hazard_id: &str) -> String {
        self.insight(hazard_id)
            .unwrap_or_else(|| INSIGHT_PLACEHOLDER.to_string())
    }

    /// A snapshot of every cached insight.
    #[must_use]
    pub fn insights(&self) -> BTreeMap<String, String> {
        self.cache.snapshot()
    }

    #[must_use]
    pub const fn config(&self) -> &AlertConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use safe_drive_ai::AiError;
    use safe_drive_hazard_models::{GeoPoint, RiskLevel};
    use tokio::sync::Semaphore;

    use super::*;

    const LONG_BRIDGE: GeoPoint = GeoPoint::new(6.6917, 3.4022);
    const KANO: GeoPoint = GeoPoint::new(12.0, 8.5);

    /// Fails its first `failures` calls, then succeeds. With a gate, every
    /// call waits for a permit first.
    #[derive(Default)]
    struct ScriptedInsights {
        calls: AtomicUsize,
        failures: usize,
        gate: Option<Arc<Semaphore>>,
    }

    impl ScriptedInsights {
        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait::async_trait]
    impl InsightService for ScriptedInsights {
        async fn request_insight(&self, hazard: &HazardSegment) -> Result<String, AiError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(gate) = &self.gate {
                let _permit = gate.acquire().await.unwrap();
            }
            if call < self.failures {
                return Err(AiError::Provider {
                    message: "offline".to_string(),
                });
            }
            Ok(format!("Drive carefully near {}.", hazard.name))
        }
    }

    fn manager_with(service: &Arc<ScriptedInsights>, config: AlertConfig) -> ProximityAlertManager {
        ProximityAlertManager::new(
            Arc::new(HazardCatalog::embedded()),
            service.clone(),
            config,
        )
    }

    fn at(point: GeoPoint) -> LocationSample {
        LocationSample::at(point)
    }

    fn segment(id: &str, coordinates: GeoPoint) -> HazardSegment {
        HazardSegment {
            id: id.to_string(),
            name: id.to_string(),
            location: String::new(),
            coordinates,
            risk_level: RiskLevel::Medium,
            description: String::new(),
            recent_accident_count: 0,
            common_causes: Vec::new(),
        }
    }

    #[tokio::test]
    async fn driver_on_long_bridge_gets_single_alert() {
        let service = Arc::new(ScriptedInsights::default());
        let mut manager = manager_with(&service, AlertConfig::default());

        let outcome = manager.on_location_update(at(LONG_BRIDGE));
        assert!(outcome.alerts_replaced);
        assert_eq!(outcome.insight_requests.len(), 1);

        let alerts = manager.alerts();
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].hazard_id, "lag-ib-1");
        assert!(alerts[0].distance_km.abs() < f64::EPSILON);
        assert!(alerts[0].active);

        let active = manager.active_alerts();
        assert_eq!(active[0].insight_or_placeholder(), INSIGHT_PLACEHOLDER);

        outcome.wait_for_insights().await;
        assert_eq!(service.calls(), 1);
        let active = manager.active_alerts();
        assert!(active[0].insight_or_placeholder().starts_with("Drive carefully"));
        assert_eq!(manager.last_sample().map(|s| s.coordinates), Some(LONG_BRIDGE));
    }

    #[tokio::test]
    async fn far_from_every_hazard_raises_nothing() {
        let service = Arc::new(ScriptedInsights::default());
        let mut manager = manager_with(&service, AlertConfig::default());

        let outcome = manager.on_location_update(at(KANO));
        assert!(!outcome.alerts_replaced);
        assert!(outcome.insight_requests.is_empty());
        assert!(manager.alerts().is_empty());
        assert_eq!(manager.alerts_revision(), 0);
        assert_eq!(service.calls(), 0);
    }

    #[tokio::test]
    async fn empty_to_empty_leaves_list_untouched() {
        let service = Arc::new(ScriptedInsights::default());
        let mut manager = manager_with(&service, AlertConfig::default());

        manager.on_location_update(at(KANO));
        manager.on_location_update(at(KANO));
        assert_eq!(manager.alerts_revision(), 0);

        manager.on_location_update(at(LONG_BRIDGE)).wait_for_insights().await;
        assert_eq!(manager.alerts_revision(), 1);

        let leaving = manager.on_location_update(at(KANO));
        assert!(leaving.alerts_replaced);
        assert!(manager.alerts().is_empty());
        assert_eq!(manager.alerts_revision(), 2);

        let still_away = manager.on_location_update(at(KANO));
        assert!(!still_away.alerts_replaced);
        assert_eq!(manager.alerts_revision(), 2);
    }

    #[tokio::test]
    async fn non_empty_lists_are_always_replaced() {
        let service = Arc::new(ScriptedInsights::default());
        let mut manager = manager_with(&service, AlertConfig::default());

        manager.on_location_update(at(LONG_BRIDGE)).wait_for_insights().await;
        let first_id = manager.alerts()[0].id.clone();

        let outcome = manager.on_location_update(at(LONG_BRIDGE));
        assert!(outcome.alerts_replaced);
        assert_eq!(manager.alerts_revision(), 2);
        assert_ne!(manager.alerts()[0].id, first_id);
    }

    #[tokio::test]
    async fn same_location_same_alerts() {
        let service = Arc::new(ScriptedInsights::default());
        let config = AlertConfig::with_threshold(30.0).unwrap();
        let mut manager = manager_with(&service, config);

        let summarize = |alerts: &[Alert]| {
            alerts
                .iter()
                .map(|a| (a.hazard_id.clone(), a.distance_km.to_bits()))
                .collect::<Vec<_>>()
        };

        manager.on_location_update(at(LONG_BRIDGE)).wait_for_insights().await;
        let first = summarize(manager.alerts());
        manager.on_location_update(at(LONG_BRIDGE));
        let second = summarize(manager.alerts());

        assert_eq!(first.len(), 2);
        assert_eq!(first, second);
        assert_eq!(first[0].0, "lag-ib-1");
        assert_eq!(first[1].0, "3mb-1");
    }

    #[tokio::test]
    async fn threshold_is_inclusive_at_exact_distance() {
        let hazard = segment("probe", GeoPoint::new(6.5, 3.4));
        let driver = GeoPoint::new(6.51, 3.41);
        let exact = distance_km(driver, hazard.coordinates);
        let catalog = Arc::new(HazardCatalog::new(vec![hazard]).unwrap());
        let service: Arc<ScriptedInsights> = Arc::new(ScriptedInsights::default());

        let mut inclusive = ProximityAlertManager::new(
            Arc::clone(&catalog),
            service.clone(),
            AlertConfig::with_threshold(exact).unwrap(),
        );
        inclusive.on_location_update(at(driver));
        assert_eq!(inclusive.alerts().len(), 1);

        let mut exclusive = ProximityAlertManager::new(
            catalog,
            service,
            AlertConfig::with_threshold(exact - 1e-9).unwrap(),
        );
        exclusive.on_location_update(at(driver));
        assert!(exclusive.alerts().is_empty());
    }

    #[tokio::test]
    async fn cached_insight_is_never_requested_again() {
        let service = Arc::new(ScriptedInsights::default());
        let mut manager = manager_with(&service, AlertConfig::default());

        manager.on_location_update(at(LONG_BRIDGE)).wait_for_insights().await;
        manager.on_location_update(at(KANO));
        let again = manager.on_location_update(at(LONG_BRIDGE));

        assert!(again.insight_requests.is_empty());
        assert_eq!(service.calls(), 1);
        assert_eq!(manager.insights().len(), 1);
    }

    #[tokio::test]
    async fn failed_insight_keeps_alert_and_retries() {
        let service = Arc::new(ScriptedInsights {
            failures: 1,
            ..ScriptedInsights::default()
        });
        let mut manager = manager_with(&service, AlertConfig::default());
        let mut events = manager.subscribe_events();

        manager.on_location_update(at(LONG_BRIDGE)).wait_for_insights().await;
        assert_eq!(manager.alerts().len(), 1);
        assert!(manager.insight("lag-ib-1").is_none());
        assert_eq!(manager.insight_or_placeholder("lag-ib-1"), INSIGHT_PLACEHOLDER);
        assert!(matches!(
            events.recv().await,
            Some(AlertEvent::InsightFailed { hazard_id, message })
                if hazard_id == "lag-ib-1" && message.contains("offline")
        ));

        let retry = manager.on_location_update(at(LONG_BRIDGE));
        assert_eq!(retry.insight_requests.len(), 1);
        retry.wait_for_insights().await;

        assert_eq!(service.calls(), 2);
        assert!(manager.insight("lag-ib-1").is_some());
        assert_eq!(
            events.recv().await,
            Some(AlertEvent::InsightReady {
                hazard_id: "lag-ib-1".to_string()
            })
        );
    }

    #[tokio::test]
    async fn overlapping_requests_issued_by_default() {
        let gate = Arc::new(Semaphore::new(0));
        let service = Arc::new(ScriptedInsights {
            gate: Some(Arc::clone(&gate)),
            ..ScriptedInsights::default()
        });
        let mut manager = manager_with(&service, AlertConfig::default());

        let first = manager.on_location_update(at(LONG_BRIDGE));
        let second = manager.on_location_update(at(LONG_BRIDGE));
        assert_eq!(first.insight_requests.len(), 1);
        assert_eq!(second.insight_requests.len(), 1);

        gate.add_permits(2);
        first.wait_for_insights().await;
        second.wait_for_insights().await;
        assert_eq!(service.calls(), 2);
        assert!(manager.insight("lag-ib-1").is_some());
    }

    #[tokio::test]
    async fn dedupe_skips_in_flight_requests() {
        let gate = Arc::new(Semaphore::new(0));
        let service = Arc::new(ScriptedInsights {
            gate: Some(Arc::clone(&gate)),
            ..ScriptedInsights::default()
        });
        let config = AlertConfig {
            dedupe_in_flight_insights: true,
            ..AlertConfig::default()
        };
        let mut manager = manager_with(&service, config);

        let first = manager.on_location_update(at(LONG_BRIDGE));
        let second = manager.on_location_update(at(LONG_BRIDGE));
        assert_eq!(first.insight_requests.len(), 1);
        assert!(second.insight_requests.is_empty());

        gate.add_permits(1);
        first.wait_for_insights().await;
        assert_eq!(service.calls(), 1);
        assert!(manager.insight("lag-ib-1").is_some());
    }

    #[test]
    fn outside_runtime_alerts_still_computed() {
        let service = Arc::new(ScriptedInsights::default());
        let mut manager = manager_with(&service, AlertConfig::default());

        let outcome = manager.on_location_update(at(LONG_BRIDGE));
        assert_eq!(manager.alerts().len(), 1);
        assert!(outcome.insight_requests.is_empty());
    }

    #[test]
    fn provider_error_leaves_state_alone() {
        let service = Arc::new(ScriptedInsights::default());
        let manager = manager_with(&service, AlertConfig::default());
        manager.on_provider_error(&LocationError::Unavailable {
            message: "gps off".to_string(),
        });
        assert!(manager.alerts().is_empty());
        assert!(manager.last_sample().is_none());
        assert_eq!(manager.alerts_revision(), 0);
    }
}
