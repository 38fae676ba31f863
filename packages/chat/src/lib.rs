#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Conversation state for the road-safety consultant.
//!
//! A [`ChatSession`] owns the ordered transcript of one conversation.
//! Every user message gets exactly one assistant entry after it: the
//! service's reply, or [`FALLBACK_REPLY`] when the service fails. Both are
//! appended together once the request settles. Nothing
//! is persisted; [`format_transcript`] and [`export_json`] render the
//! transcript for display or export.

pub mod interactive;

use std::fmt::Write as _;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use safe_drive_ai::chat::ChatService;
use safe_drive_ai::providers::{ChatRole, Message};
use thiserror::Error;

/// A transcript entry.
pub type ChatMessage = Message;

/// Assistant entry recorded when the chat service fails.
pub const FALLBACK_REPLY: &str = "Connection issue. Offline mode for safety.";

/// Assistant entry recorded when the service answers with no text.
pub const EMPTY_REPLY: &str = "No response.";

/// Maximum title length (truncated from first user message).
const MAX_TITLE_LENGTH: usize = 100;

/// Errors from chat session operations.
#[derive(Debug, Error)]
pub enum ChatError {
    /// The message was empty or whitespace only.
    #[error("Message is empty")]
    EmptyMessage,

    /// JSON serialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Shared view of whether a [`ChatSession`] is awaiting a reply.
///
/// Clones observe the same flag, so a display can watch it while the
/// session is mutably borrowed by [`ChatSession::send_message`].
#[derive(Debug, Clone, Default)]
pub struct PendingHandle(Arc<AtomicBool>);

impl PendingHandle {
    /// Whether a reply is currently awaited.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Resets the pending flag when a send completes or is cancelled.
struct PendingGuard(PendingHandle);

impl PendingGuard {
    fn set(handle: &PendingHandle) -> Self {
        handle.0.store(true, Ordering::Release);
        Self(handle.clone())
    }
}

impl Drop for PendingGuard {
    fn drop(&mut self) {
        self.0.0.store(false, Ordering::Release);
    }
}

/// One conversation with the road-safety consultant.
#[derive(Debug, Default)]
pub struct ChatSession {
    transcript: Vec<ChatMessage>,
    pending: PendingHandle,
}

impl ChatSession {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Asks `service` for a reply to the transcript plus `text`, then
    /// appends `text` as a user entry followed by the reply. Returns the
    /// appended assistant entry.
    ///
    /// A failed request is recorded as [`FALLBACK_REPLY`] rather than
    /// returned as an error. If the returned future is dropped before the
    /// reply settles, the transcript is left unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`ChatError::EmptyMessage`] if `text` is blank, in which case
    /// the transcript is unchanged.
    pub async fn send_message(
        &mut self,
        service: &dyn ChatService,
        text: &str,
    ) -> Result<&ChatMessage, ChatError> {
        if text.trim().is_empty() {
            return Err(ChatError::EmptyMessage);
        }

        let user = Message::user(text);
        let mut request = Vec::with_capacity(self.transcript.len() + 1);
        request.extend_from_slice(&self.transcript);
        request.push(user.clone());

        let result = {
            let _pending = PendingGuard::set(&self.pending);
            service.request_reply(&request).await
        };

        let reply = match result {
            Ok(reply) if reply.trim().is_empty() => EMPTY_REPLY.to_string(),
            Ok(reply) => reply,
            Err(e) => {
                log::warn!("Chat request failed: {e}");
                FALLBACK_REPLY.to_string()
            }
        };

        self.transcript.push(user);
        self.transcript.push(Message::assistant(reply));
        Ok(&self.transcript[self.transcript.len() - 1])
    }

    /// Whether a reply is currently awaited.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.pending.is_pending()
    }

    /// A handle that observes the pending flag from outside the session.
    #[must_use]
    pub fn pending_handle(&self) -> PendingHandle {
        self.pending.clone()
    }

    /// The transcript in order.
    #[must_use]
    pub fn transcript(&self) -> &[ChatMessage] {
        &self.transcript
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.transcript.is_empty()
    }

    /// The first user message, truncated, for use as a heading.
    #[must_use]
    pub fn title(&self) -> Option<String> {
        self.transcript
            .iter()
            .find(|m| m.role == ChatRole::User)
            .map(|m| truncate_title(&m.content))
    }
}

/// Renders a transcript as labelled blocks for terminal display.
#[must_use]
pub fn format_transcript(messages: &[ChatMessage]) -> String {
    let mut output = String::new();

    for msg in messages {
        let label = match msg.role {
            ChatRole::User => "YOU",
            ChatRole::Assistant => "SAFE DRIVE AI",
        };
        let _ = writeln!(output, "--- {label} ---");
        let _ = writeln!(output, "{}", msg.content);
        let _ = writeln!(output);
    }

    output
}

/// Serializes a transcript as pretty-printed JSON.
///
/// # Errors
///
/// Returns [`ChatError::Json`] if serialization fails.
pub fn export_json(messages: &[ChatMessage]) -> Result<String, ChatError> {
    Ok(serde_json::to_string_pretty(messages)?)
}

/// Truncates a string to [`MAX_TITLE_LENGTH`] characters, adding "..."
/// if truncated.
fn truncate_title(s: &str) -> String {
    let trimmed = s.trim();
    if trimmed.chars().count() <= MAX_TITLE_LENGTH {
        trimmed.to_string()
    } else {
        let head: String = trimmed.chars().take(MAX_TITLE_LENGTH - 3).collect();
        format!("{head}...")
    }
}
