#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! LLM provider abstraction and the two AI-backed services of the
//! safe-drive system.
//!
//! Supports Anthropic Claude, `OpenAI` (and any `OpenAI`-compatible
//! local/self-hosted server via `AI_BASE_URL`), and Google Gemini behind the
//! common [`providers::LlmProvider`] trait. On top of it:
//!
//! - [`insight::InsightService`] turns a hazard segment into a short safety
//!   briefing for a driver approaching it.
//! - [`chat::ChatService`] produces the next reply of the road-safety
//!   consultant given the conversation so far.

pub mod chat;
pub mod insight;
pub mod providers;

use thiserror::Error;

/// Errors that can occur during AI operations.
#[derive(Debug, Error)]
pub enum AiError {
    /// HTTP request to LLM provider failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Provider-specific error.
    #[error("Provider error: {message}")]
    Provider {
        /// Description of what went wrong.
        message: String,
    },

    /// The provider answered but returned no text.
    #[error("Provider returned an empty response")]
    EmptyResponse,

    /// The provider withheld its answer.
    #[error("Provider withheld the response")]
    Blocked,

    /// Configuration error.
    #[error("Configuration error: {message}")]
    Config {
        /// Description.
        message: String,
    },
}
