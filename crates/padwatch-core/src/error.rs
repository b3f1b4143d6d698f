// ── Core error types ──
//
// Domain errors from padwatch-core. Consumers never see HTTP status
// codes or JSON parse failures directly; the `From<padwatch_api::Error>`
// impl translates transport-layer errors into these variants.

use thiserror::Error;

use crate::model::SerialMapError;
use crate::store::StoreError;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot connect to {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    #[error("Request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    // ── Data errors ──────────────────────────────────────────────────
    #[error("Malformed device snapshot: {message}")]
    MalformedSnapshot { message: String },

    #[error("Malformed response: {message}")]
    MalformedResponse { message: String },

    #[error("Serial map error: {0}")]
    SerialMap(#[from] SerialMapError),

    #[error("Debounce store error: {0}")]
    Store(#[from] StoreError),

    // ── API errors (wrapped, not exposed raw) ────────────────────────
    #[error("API error: {message}")]
    Api {
        message: String,
        /// HTTP status code (if applicable).
        status: Option<u16>,
    },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Whether retrying the same request could plausibly succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::ConnectionFailed { .. } | Self::Timeout { .. } => true,
            Self::Api {
                status: Some(status),
                ..
            } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<padwatch_api::Error> for CoreError {
    fn from(err: padwatch_api::Error) -> Self {
        match err {
            padwatch_api::Error::Authentication { message } => {
                CoreError::AuthenticationFailed { message }
            }
            padwatch_api::Error::InvalidApiKey => CoreError::AuthenticationFailed {
                message: "Invalid API key".into(),
            },
            padwatch_api::Error::Transport(ref e) => {
                // Timeouts with a known limit arrive as `Error::Timeout`.
                if e.is_timeout() || e.is_connect() {
                    CoreError::ConnectionFailed {
                        url: e
                            .url()
                            .map_or_else(|| "<unknown>".into(), ToString::to_string),
                        reason: e.to_string(),
                    }
                } else {
                    CoreError::Api {
                        message: e.to_string(),
                        status: e.status().map(|s| s.as_u16()),
                    }
                }
            }
            padwatch_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            padwatch_api::Error::Timeout { timeout_secs } => CoreError::Timeout { timeout_secs },
            padwatch_api::Error::Tls(msg) => CoreError::ConnectionFailed {
                url: String::new(),
                reason: format!("TLS error: {msg}"),
            },
            padwatch_api::Error::Api {
                surface,
                status,
                message,
            } => CoreError::Api {
                message: format!("{surface}: {message}"),
                status: Some(status),
            },
            padwatch_api::Error::Deserialization { message, body: _ } => {
                CoreError::MalformedResponse { message }
            }
            padwatch_api::Error::TokenCache(msg) => CoreError::Internal(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gateway_overload_is_transient() {
        let err: CoreError = padwatch_api::Error::Api {
            surface: "gateway",
            status: 502,
            message: "bad gateway".into(),
        }
        .into();
        assert!(err.is_transient());
    }

    #[test]
    fn timeout_keeps_configured_limit() {
        let err: CoreError = padwatch_api::Error::Timeout { timeout_secs: 12 }.into();
        assert!(matches!(err, CoreError::Timeout { timeout_secs: 12 }));
        assert_eq!(err.to_string(), "Request timed out after 12s");
        assert!(err.is_transient());
    }

    #[test]
    fn auth_failures_are_not_transient() {
        let err: CoreError = padwatch_api::Error::InvalidApiKey.into();
        assert!(matches!(err, CoreError::AuthenticationFailed { .. }));
        assert!(!err.is_transient());
    }
}
