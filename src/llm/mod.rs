//! Vision analysis domain — public API.

mod client;
pub mod prompts;

pub use client::AnalysisClient;

use crate::capture::ImagePayload;
use async_trait::async_trait;

/// Sends one screenshot to an inference endpoint and extracts plain text.
///
/// Implementations must resolve every failure — missing credential,
/// transport, non-success status, unexpected response shape — into an
/// `AnalysisError` value instead of panicking or returning foreign errors.
#[async_trait]
pub trait Analyzer: Send + Sync {
    async fn analyze(&self, image: ImagePayload) -> Result<String, AnalysisError>;
}

/// Normalized analysis failure. The `Display` strings are what the overlay
/// shows, so they are written for a human reading the window, not a log.
#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    #[error("Please set your OpenAI API key (OPENAI_API_KEY) before using screen analysis.")]
    NotConfigured,

    #[error("Analysis request failed: {0}")]
    Transport(String),

    #[error("API error {status}: {body}")]
    Remote { status: u16, body: String },

    #[error("could not parse response")]
    ParseFailed,
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── Display strings are part of the UI contract ─────────────────────

    #[test]
    fn remote_error_includes_status_and_body() {
        let e = AnalysisError::Remote {
            status: 500,
            body: "server error".to_string(),
        };
        let s = e.to_string();
        assert!(s.contains("500"));
        assert!(s.contains("server error"));
    }

    #[test]
    fn not_configured_names_the_env_var() {
        assert!(AnalysisError::NotConfigured
            .to_string()
            .contains("OPENAI_API_KEY"));
    }
}
