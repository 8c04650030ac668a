//! The `CompletionClient` trait -- the seam to the external text-completion
//! service.
//!
//! The service is treated as unreliable and untrusted: transport and status
//! failures surface as [`UpstreamError`], while the text it returns is handed
//! to the normalizer untouched. The trait is object-safe so a single client
//! can be shared as `Arc<dyn CompletionClient>` across request handlers.

pub mod openai;

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use openai::OpenAiClient;

/// Default model name used when a request does not specify one.
pub const DEFAULT_MODEL: &str = "gpt-4";

/// Default base URL of the OpenAI-compatible API.
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// A single prompt sent to the completion service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionRequest {
    pub model: String,
    pub prompt: String,
}

impl CompletionRequest {
    pub fn new(model: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            prompt: prompt.into(),
        }
    }
}

/// The message content returned by the completion service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionResponse {
    pub text: String,
}

/// Failures talking to the completion service. Never produced by the
/// normalizer.
#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("completion service unreachable: {0}")]
    Transport(String),

    #[error("completion request timed out after {0:?}")]
    Timeout(Duration),

    /// `body` is kept for logs and is not part of the message.
    #[error("completion service returned status {status}")]
    Status { status: u16, body: String },

    #[error("completion service response could not be decoded: {0}")]
    Decode(String),

    #[error("completion service returned no choices")]
    NoChoices,
}

impl UpstreamError {
    /// Whether a retry could plausibly succeed (network trouble, 429, 5xx).
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport(_) | Self::Timeout(_) => true,
            Self::Status { status, .. } => *status == 429 || *status >= 500,
            Self::Decode(_) | Self::NoChoices => false,
        }
    }
}

/// Call policy for the completion service.
///
/// Retries are off by default: a failed generation is surfaced to the caller,
/// who decides whether to regenerate.
#[derive(Debug, Clone)]
pub struct CompletionConfig {
    /// Base URL of the OpenAI-compatible API, without a trailing slash.
    pub base_url: String,
    /// Bearer token. `None` for local servers that need no auth.
    pub api_key: Option<String>,
    /// Model used when a request leaves it empty.
    pub default_model: String,
    /// Per-attempt request timeout.
    pub timeout: Duration,
    /// Extra attempts after the first one for retryable failures.
    pub max_retries: u32,
    /// Delay before the first retry; doubles on each further retry.
    pub retry_backoff: Duration,
}

impl CompletionConfig {
    pub const DEFAULT_TIMEOUT_SECS: u64 = 120;
    pub const DEFAULT_RETRY_BACKOFF_MS: u64 = 500;

    pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_owned(),
            api_key,
            ..Self::default()
        }
    }

    /// Backoff before retry number `attempt` (1-based).
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        self.retry_backoff
            .saturating_mul(2u32.saturating_pow(attempt.saturating_sub(1)))
    }
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_owned(),
            api_key: None,
            default_model: DEFAULT_MODEL.to_owned(),
            timeout: Duration::from_secs(Self::DEFAULT_TIMEOUT_SECS),
            max_retries: 0,
            retry_backoff: Duration::from_millis(Self::DEFAULT_RETRY_BACKOFF_MS),
        }
    }
}

/// Adapter interface for text-completion backends.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Short backend name for logs (e.g. "openai").
    fn name(&self) -> &str;

    /// Model used when the caller has no preference.
    fn default_model(&self) -> &str;

    /// Send one prompt and return the raw message content.
    async fn complete(
        &self,
        request: &CompletionRequest,
    ) -> Result<CompletionResponse, UpstreamError>;
}

// Compile-time assertion: CompletionClient must be object-safe.
const _: () = {
    fn _assert_object_safe(_: &dyn CompletionClient) {}
};
