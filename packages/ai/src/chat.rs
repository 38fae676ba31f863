//! Road-safety consultant replies.

use std::sync::Arc;

use crate::AiError;
use crate::providers::{GenerationOptions, LlmProvider, Message};

/// System prompt of the road-safety consultant.
pub const SYSTEM_PROMPT: &str = "You are the NaijaSafeDrive AI, an expert road-safety \
     consultant for drivers in Nigeria. Give advice grounded in FRSC (Federal Road Safety \
     Corps) guidelines and local road conditions. Be concise and culturally relevant.";

const CHAT_MAX_TOKENS: u32 = 1024;

/// Produces the next assistant reply for a conversation.
#[async_trait::async_trait]
pub trait ChatService: Send + Sync {
    /// Requests a reply to `transcript`, whose last entry is the user's
    /// newest message.
    ///
    /// # Errors
    ///
    /// Returns [`AiError`] if the backing service fails.
    async fn request_reply(&self, transcript: &[Message]) -> Result<String, AiError>;
}

/// [`ChatService`] backed by an LLM provider.
#[derive(Clone)]
pub struct LlmChatService {
    provider: Arc<dyn LlmProvider>,
}

impl LlmChatService {
    #[must_use]
    pub const fn new(provider: Arc<dyn LlmProvider>) -> Self {
        Self { provider }
    }
}

#[async_trait::async_trait]
impl ChatService for LlmChatService {
    async fn request_reply(&self, transcript: &[Message]) -> Result<String, AiError> {
        log::debug!(
            "Requesting chat reply ({} messages) via {}",
            transcript.len(),
            self.provider.name()
        );

        let options = GenerationOptions {
            temperature: None,
            max_tokens: CHAT_MAX_TOKENS,
        };
        let response = self
            .provider
            .chat(SYSTEM_PROMPT, transcript, &options)
            .await?;

        Ok(response.text)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::providers::{ChatRole, LlmResponse, StopReason};

    #[derive(Default)]
    struct EchoProvider {
        calls: Mutex<Vec<(String, Vec<Message>)>>,
    }

    #[async_trait::async_trait]
    impl LlmProvider for EchoProvider {
        fn name(&self) -> &'static str {
            "echo"
        }

        async fn chat(
            &self,
            system_prompt: &str,
            messages: &[Message],
            _options: &GenerationOptions,
        ) -> Result<LlmResponse, AiError> {
            self.calls
                .lock()
                .unwrap()
                .push((system_prompt.to_string(), messages.to_vec()));
            let last = messages.last().map_or("", |m| m.content.as_str());
            Ok(LlmResponse {
                text: format!("echo: {last}"),
                stop_reason: StopReason::EndTurn,
            })
        }
    }

    #[tokio::test]
    async fn sends_whole_transcript_with_consultant_prompt() {
        let provider = Arc::new(EchoProvider::default());
        let service = LlmChatService::new(provider.clone());
        let transcript = [
            Message::user("Is it safe to drive at night?"),
            Message::assistant("Avoid night travel on highways."),
            Message::user("What about Ore?"),
        ];

        let reply = service.request_reply(&transcript).await.unwrap();
        assert_eq!(reply, "echo: What about Ore?");

        let calls = provider.calls.lock().unwrap();
        let (system, messages) = &calls[0];
        assert_eq!(system, SYSTEM_PROMPT);
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[1].role, ChatRole::Assistant);
    }
}
