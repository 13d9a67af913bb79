use crate::redaction::redact_sensitive_text;
use thiserror::Error;

/// The single failure kind a generation call can surface.
///
/// Authentication, network, quota and malformed-response failures all land
/// here; callers display `message` and do not branch on it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct GenerationError {
    pub message: String,
}

impl GenerationError {
    pub fn new<S: Into<String>>(message: S) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<anyhow::Error> for GenerationError {
    fn from(err: anyhow::Error) -> Self {
        // `{:#}` keeps the context chain on one line.
        Self::new(redact_sensitive_text(&format!("{:#}", err)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{anyhow, Context};

    #[test]
    fn display_is_the_bare_message() {
        let err = GenerationError::new("network timeout");
        assert_eq!(err.to_string(), "network timeout");
    }

    #[test]
    fn anyhow_conversion_keeps_context_and_masks_keys() {
        let source: anyhow::Result<()> =
            Err(anyhow!("GET https://x.test/models?key=AIzaSyA1234567890abcdefghij failed"));
        let err: GenerationError = source
            .context("Failed to reach provider")
            .unwrap_err()
            .into();
        assert!(err.message.starts_with("Failed to reach provider: "));
        assert!(!err.message.contains("AIzaSyA1234567890abcdefghij"));
        assert!(err.message.contains("key=[REDACTED]"));
    }
}
