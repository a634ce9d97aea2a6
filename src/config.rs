//! Runtime configuration from the environment.
//!
//! Settings come from process environment variables (a `.env` file is
//! loaded by `main` via dotenvy before this runs). Nothing is persisted:
//! the credential is read once at startup and held in memory.

use std::time::Duration;

/// Default chat-completions endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://api.openai.com/v1/chat/completions";

/// Hard ceiling on one analysis request, connection setup included.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Values that mean "nobody configured a real key".
const KEY_PLACEHOLDERS: &[&str] = &["your-api-key", "YOUR_API_KEY", "sk-..."];

/// Everything the analysis client needs, resolved once at startup.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Bearer credential for the analysis endpoint. `None` when unset or
    /// left at a placeholder value — the client short-circuits without a
    /// network call in that case.
    pub api_key: Option<String>,
    pub endpoint: String,
    pub request_timeout: Duration,
}

impl Settings {
    /// Read settings from the process environment.
    ///
    /// `OPENAI_API_KEY` carries the credential; `OPENAI_API_ENDPOINT`
    /// optionally overrides the endpoint (useful against OpenAI-compatible
    /// gateways).
    pub fn from_env() -> Self {
        let api_key = std::env::var("OPENAI_API_KEY")
            .ok()
            .and_then(normalize_key);

        let endpoint = std::env::var("OPENAI_API_ENDPOINT")
            .ok()
            .filter(|e| !e.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string());

        if api_key.is_none() {
            log::warn!("[CONFIG] No OPENAI_API_KEY set — analysis will report it is unconfigured");
        }

        Self {
            api_key,
            endpoint,
            request_timeout: REQUEST_TIMEOUT,
        }
    }
}

/// Treat empty and placeholder keys as absent.
fn normalize_key(raw: String) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || KEY_PLACEHOLDERS.contains(&trimmed) {
        None
    } else {
        Some(trimmed.to_string())
    }
}
