//! Hazard safety briefings.
//!
//! An [`InsightService`] turns a [`HazardSegment`] into a few sentences of
//! advice for a driver about to reach it.

use std::sync::Arc;

use safe_drive_hazard_models::HazardSegment;

use crate::AiError;
use crate::providers::{GenerationOptions, LlmProvider, Message, StopReason};

const INSIGHT_SYSTEM_PROMPT: &str = "You are a road-safety assistant for drivers in Nigeria. \
     Answer in plain text without markdown.";

const INSIGHT_TEMPERATURE: f32 = 0.7;

const INSIGHT_MAX_TOKENS: u32 = 256;

/// Produces a short safety briefing for a hazard segment.
#[async_trait::async_trait]
pub trait InsightService: Send + Sync {
    /// Requests a briefing for `hazard`.
    ///
    /// # Errors
    ///
    /// Returns [`AiError`] if the backing service fails, withholds its
    /// answer, or answers with no text.
    async fn request_insight(&self, hazard: &HazardSegment) -> Result<String, AiError>;
}

/// Builds the user prompt sent for `hazard`.
#[must_use]
pub fn build_insight_prompt(hazard: &HazardSegment) -> String {
    format!(
        "Provide a brief, professional safety briefing for a driver approaching \
         the following road segment in Nigeria:\n\
         Name: {}\n\
         Risk Level: {}\n\
         Common Causes: {}\n\n\
         Keep it actionable and local (Nigerian context). Max 3 sentences.",
        hazard.name,
        hazard.risk_level,
        hazard.common_causes.join(", "),
    )
}

/// [`InsightService`] backed by an LLM provider.
#[derive(Clone)]
pub struct LlmInsightService {
    provider: Arc<dyn LlmProvider>,
}

impl LlmInsightService {
    #[must_use]
    pub const fn new(provider: Arc<dyn LlmProvider>) -> Self {
        Self { provider }
    }
}

#[async_trait::async_trait]
impl InsightService for LlmInsightService {
    async fn request_insight(&self, hazard: &HazardSegment) -> Result<String, AiError> {
        log::debug!(
            "Requesting insight for {} via {}",
            hazard.id,
            self.provider.name()
        );

        let options = GenerationOptions {
            temperature: Some(INSIGHT_TEMPERATURE),
            max_tokens: INSIGHT_MAX_TOKENS,
        };
        let response = self
            .provider
            .chat(
                INSIGHT_SYSTEM_PROMPT,
                &[Message::user(build_insight_prompt(hazard))],
                &options,
            )
            .await?;

        match response.stop_reason {
            StopReason::Blocked => return Err(AiError::Blocked),
            StopReason::MaxTokens => log::warn!("Insight for {} was truncated", hazard.id),
            StopReason::EndTurn => {}
        }

        let text = response.text.trim();
        if text.is_empty() {
            return Err(AiError::EmptyResponse);
        }

        Ok(text.to_string())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use safe_drive_hazard_models::{GeoPoint, RiskLevel};

    use super::*;
    use crate::providers::LlmResponse;

    struct ScriptedProvider {
        reply: Result<String, String>,
        stop_reason: StopReason,
        seen: Mutex<Vec<(String, Vec<Message>, GenerationOptions)>>,
    }

    impl ScriptedProvider {
        fn new(reply: Result<&str, &str>) -> Self {
            Self {
                reply: reply.map(str::to_string).map_err(str::to_string),
                stop_reason: StopReason::EndTurn,
                seen: Mutex::new(Vec::new()),
            }
        }

        fn stopping(mut self, stop_reason: StopReason) -> Self {
            self.stop_reason = stop_reason;
            self
        }
    }

    #[async_trait::async_trait]
    impl LlmProvider for ScriptedProvider {
        fn name(&self) -> &'static str {
            "scripted"
        }

        async fn chat(
            &self,
            system_prompt: &str,
            messages: &[Message],
            options: &GenerationOptions,
        ) -> Result<LlmResponse, AiError> {
            self.seen.lock().unwrap().push((
                system_prompt.to_string(),
                messages.to_vec(),
                *options,
            ));
            match &self.reply {
                Ok(text) => Ok(LlmResponse {
                    text: text.clone(),
                    stop_reason: self.stop_reason,
                }),
                Err(message) => Err(AiError::Provider {
                    message: message.clone(),
                }),
            }
        }
    }

    fn long_bridge() -> HazardSegment {
        HazardSegment {
            id: "lag-ib-1".to_string(),
            name: "Long Bridge".to_string(),
            location: "Lagos-Ibadan Expressway".to_string(),
            coordinates: GeoPoint::new(6.6917, 3.4022),
            risk_level: RiskLevel::High,
            description: "Frequent high-speed collisions.".to_string(),
            recent_accident_count: 12,
            common_causes: vec!["Speeding".to_string(), "Brake failure".to_string()],
        }
    }

    #[test]
    fn prompt_names_hazard_risk_and_causes() {
        let prompt = build_insight_prompt(&long_bridge());
        assert!(prompt.contains("Name: Long Bridge"));
        assert!(prompt.contains("Risk Level: High"));
        assert!(prompt.contains("Common Causes: Speeding, Brake failure"));
        assert!(prompt.ends_with("Max 3 sentences."));
    }

    #[tokio::test]
    async fn returns_trimmed_reply_at_briefing_temperature() {
        let provider = Arc::new(ScriptedProvider::new(Ok("  Slow down before the bend.\n")));
        let service = LlmInsightService::new(provider.clone());

        let text = service.request_insight(&long_bridge()).await.unwrap();
        assert_eq!(text, "Slow down before the bend.");

        let seen = provider.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        let (_, messages, options) = &seen[0];
        assert_eq!(messages.len(), 1);
        assert!(messages[0].content.contains("Long Bridge"));
        assert_eq!(options.temperature, Some(INSIGHT_TEMPERATURE));
    }

    #[tokio::test]
    async fn blank_reply_is_an_error() {
        let service = LlmInsightService::new(Arc::new(ScriptedProvider::new(Ok("   "))));
        assert!(matches!(
            service.request_insight(&long_bridge()).await,
            Err(AiError::EmptyResponse)
        ));
    }

    #[tokio::test]
    async fn withheld_reply_is_an_error() {
        let provider = ScriptedProvider::new(Ok("I can't help with that.")).stopping(StopReason::Blocked);
        let service = LlmInsightService::new(Arc::new(provider));
        assert!(matches!(
            service.request_insight(&long_bridge()).await,
            Err(AiError::Blocked)
        ));
    }

    #[tokio::test]
    async fn truncated_reply_is_still_used() {
        let provider = ScriptedProvider::new(Ok("Slow down before")).stopping(StopReason::MaxTokens);
        let service = LlmInsightService::new(Arc::new(provider));
        assert_eq!(
            service.request_insight(&long_bridge()).await.unwrap(),
            "Slow down before"
        );
    }

    #[tokio::test]
    async fn provider_error_propagates() {
        let service = LlmInsightService::new(Arc::new(ScriptedProvider::new(Err("quota"))));
        assert!(matches!(
            service.request_insight(&long_bridge()).await,
            Err(AiError::Provider { message }) if message == "quota"
        ));
    }
}
