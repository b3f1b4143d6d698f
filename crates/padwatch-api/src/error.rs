use thiserror::Error;

/// Top-level error type for the `padwatch-api` crate.
///
/// Covers every failure mode across the three remote surfaces:
/// the OAuth token endpoint, the fleet API, and the remediation gateway.
/// `padwatch-core` maps these into domain errors.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// Token request rejected (bad client id/secret, disabled client, etc.)
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    /// Invalid API key (rejected by the fleet API).
    #[error("Invalid API key")]
    InvalidApiKey,

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Request timed out.
    #[error("Request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    /// TLS handshake or certificate error.
    #[error("TLS error: {0}")]
    Tls(String),

    // ── Remote API ──────────────────────────────────────────────────
    /// Non-success HTTP status from one of the APIs.
    #[error("{surface} API error (HTTP {status}): {message}")]
    Api {
        surface: &'static str,
        status: u16,
        message: String,
    },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },

    // ── Token cache ─────────────────────────────────────────────────
    /// The on-disk token cache could not be read or written.
    #[error("Token cache error: {0}")]
    TokenCache(String),
}

impl Error {
    /// Returns `true` if this error indicates the credential was rejected
    /// and fetching a new token might resolve it.
    pub fn is_auth_expired(&self) -> bool {
        matches!(
            self,
            Self::Authentication { .. }
                | Self::Api {
                    status: 401,
                    ..
                }
        )
    }

    /// Returns `true` if this is a transient error worth retrying.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            Self::Timeout { .. } => true,
            Self::Api { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }

    /// Build a deserialization error with a short body preview in the message.
    pub(crate) fn deserialization(err: &serde_json::Error, body: &str) -> Self {
        let preview = &body[..floor_char_boundary(body, 200)];
        Self::Deserialization {
            message: format!("{err} (body preview: {preview:?})"),
            body: body.to_owned(),
        }
    }
}

/// Largest char boundary `<= max` so previews never split a UTF-8 sequence.
pub(crate) fn floor_char_boundary(s: &str, max: usize) -> usize {
    if s.len() <= max {
        return s.len();
    }
    let mut idx = max;
    while !s.is_char_boundary(idx) {
        idx -= 1;
    }
    idx
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_errors_are_transient() {
        let err = Error::Api {
            surface: "gateway",
            status: 503,
            message: "busy".into(),
        };
        assert!(err.is_transient());

        let err = Error::Api {
            surface: "gateway",
            status: 400,
            message: "bad".into(),
        };
        assert!(!err.is_transient());
    }

    #[test]
    fn unauthorized_counts_as_expired_auth() {
        let err = Error::Api {
            surface: "fleet",
            status: 401,
            message: String::new(),
        };
        assert!(err.is_auth_expired());
        assert!(!Error::InvalidApiKey.is_auth_expired());
    }

    #[test]
    fn preview_respects_char_boundaries() {
        let body = "é".repeat(150);
        let idx = floor_char_boundary(&body, 201);
        assert!(body.is_char_boundary(idx));
        assert!(idx <= 201);
    }
}
