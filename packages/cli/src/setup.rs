//! Startup wiring shared by the subcommands: catalog, alert config, and
//! AI services.

use std::path::Path;
use std::sync::Arc;

use safe_drive_ai::AiError;
use safe_drive_ai::chat::{ChatService, LlmChatService};
use safe_drive_ai::insight::{InsightService, LlmInsightService};
use safe_drive_ai::providers::{LlmProvider, Message, create_provider_from_env};
use safe_drive_alerts::config::dedupe_from_env;
use safe_drive_alerts::{AlertConfig, ConfigError};
use safe_drive_hazard::{CatalogError, HazardCatalog};
use safe_drive_hazard_models::HazardSegment;

/// Loads the catalog from `path`, or from `HAZARD_CATALOG_PATH` / the
/// embedded registry when no path is given.
///
/// # Errors
///
/// Returns [`CatalogError`] if the chosen file cannot be loaded.
pub fn load_catalog(path: Option<&Path>) -> Result<HazardCatalog, CatalogError> {
    path.map_or_else(HazardCatalog::from_env, HazardCatalog::from_path)
}

/// Alert config from the environment, with CLI overrides applied on top.
///
/// # Errors
///
/// Returns [`ConfigError`] if the threshold is invalid.
pub fn alert_config(threshold_km: Option<f64>, dedupe: bool) -> Result<AlertConfig, ConfigError> {
    let mut config = match threshold_km {
        Some(km) => AlertConfig::with_threshold(km)?,
        None => AlertConfig::from_env()?,
    };
    config.dedupe_in_flight_insights |= dedupe || dedupe_from_env();
    Ok(config)
}

/// The insight and chat services used by the shell.
#[derive(Clone)]
pub struct AiServices {
    pub insight: Arc<dyn InsightService>,
    pub chat: Arc<dyn ChatService>,
}

impl AiServices {
    /// Builds both services on the provider selected by the environment.
    ///
    /// Without usable credentials both services fail every request, so
    /// alerts still work, insights stay on the placeholder, and chat
    /// answers with the offline fallback.
    #[must_use]
    pub fn from_env() -> Self {
        match create_provider_from_env() {
            Ok(provider) => {
                let provider: Arc<dyn LlmProvider> = Arc::from(provider);
                log::info!("Using AI provider: {}", provider.name());
                Self {
                    insight: Arc::new(LlmInsightService::new(Arc::clone(&provider))),
                    chat: Arc::new(LlmChatService::new(provider)),
                }
            }
            Err(e) => {
                log::warn!("AI features unavailable: {e}");
                let offline = Arc::new(OfflineService {
                    reason: e.to_string(),
                });
                Self {
                    insight: offline.clone(),
                    chat: offline,
                }
            }
        }
    }
}

/// Stands in for the AI services when no provider is configured.
struct OfflineService {
    reason: String,
}

impl OfflineService {
    fn error(&self) -> AiError {
        AiError::Config {
            message: self.reason.clone(),
        }
    }
}

#[async_trait::async_trait]
impl InsightService for OfflineService {
    async fn request_insight(&self, _hazard: &HazardSegment) -> Result<String, AiError> {
        Err(self.error())
    }
}

#[async_trait::async_trait]
impl ChatService for OfflineService {
    async fn request_reply(&self, _transcript: &[Message]) -> Result<String, AiError> {
        Err(self.error())
    }
}

#[cfg(test)]
mod tests {
    use safe_drive_chat::{ChatSession, FALLBACK_REPLY};

    use super::*;

    #[tokio::test]
    async fn offline_chat_falls_back() {
        let offline = OfflineService {
            reason: "no key".to_string(),
        };
        let mut session = ChatSession::new();
        let reply = session.send_message(&offline, "hello").await.unwrap();
        assert_eq!(reply.content, FALLBACK_REPLY);
    }

    #[test]
    fn cli_threshold_overrides_default() {
        let config = alert_config(Some(5.0), true).unwrap();
        assert!(config.in_range(5.0));
        assert!(config.dedupe_in_flight_insights);
        assert!(alert_config(Some(-1.0), false).is_err());
    }
}
