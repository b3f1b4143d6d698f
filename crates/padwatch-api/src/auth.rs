// OAuth client-credentials authentication for the remediation gateway.
//
// Tokens are cached in memory and, optionally, in a small JSON file so
// that back-to-back invocations (one per scheduled cycle) reuse a token
// instead of hitting the token endpoint every minute.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use url::Url;

use crate::error::Error;
use crate::transport::{TransportConfig, map_send_error, status_error};

/// Tokens are treated as expired this long before their real expiry.
const EXPIRY_SKEW_SECS: i64 = 60;

/// Client id + secret for the client-credentials grant.
#[derive(Debug, Clone)]
pub struct ClientCredentials {
    pub client_id: String,
    pub client_secret: SecretString,
}

/// A bearer token together with the instant it stops being usable.
#[derive(Debug, Clone)]
pub struct AccessToken {
    secret: SecretString,
    expires_at: DateTime<Utc>,
}

impl AccessToken {
    pub fn new(secret: SecretString, expires_at: DateTime<Utc>) -> Self {
        Self { secret, expires_at }
    }

    /// The raw bearer value, for building an `Authorization` header.
    pub fn expose(&self) -> &str {
        self.secret.expose_secret()
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    /// Whether the token is still usable at `now`, including the safety skew.
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        now + TimeDelta::seconds(EXPIRY_SKEW_SECS) < self.expires_at
    }
}

/// Token endpoint response body (RFC 6749 §5.1).
#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<u64>,
}

/// On-disk cache shape.
#[derive(Serialize, Deserialize)]
struct CachedToken {
    access_token: String,
    expires_at: DateTime<Utc>,
}

/// Fetches and caches OAuth bearer tokens.
pub struct TokenClient {
    http: reqwest::Client,
    token_url: Url,
    credentials: ClientCredentials,
    /// Upper bound on how long a token is trusted, regardless of `expires_in`.
    lifetime: Duration,
    cache_path: Option<PathBuf>,
    cached: RwLock<Option<AccessToken>>,
    timeout_secs: u64,
}

impl TokenClient {
    /// Reference token lifetime: one hour.
    pub const DEFAULT_LIFETIME: Duration = Duration::from_secs(3600);

    pub fn new(
        token_url: Url,
        credentials: ClientCredentials,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let http = transport.build_client()?;
        let mut client = Self::with_client(http, token_url, credentials);
        client.timeout_secs = transport.timeout_secs();
        Ok(client)
    }

    /// Create a token client with a pre-built `reqwest::Client`.
    pub fn with_client(
        http: reqwest::Client,
        token_url: Url,
        credentials: ClientCredentials,
    ) -> Self {
        Self {
            http,
            token_url,
            credentials,
            lifetime: Self::DEFAULT_LIFETIME,
            cache_path: None,
            cached: RwLock::new(None),
            timeout_secs: 30,
        }
    }

    /// Override the fixed token lifetime.
    pub fn with_lifetime(mut self, lifetime: Duration) -> Self {
        self.lifetime = lifetime;
        self
    }

    /// Persist tokens to `path` so later processes can reuse them.
    pub fn with_cache_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.cache_path = Some(path.into());
        self
    }

    /// Return a usable token: memory cache, then file cache, then the endpoint.
    pub async fn token(&self) -> Result<AccessToken, Error> {
        let now = Utc::now();

        if let Some(token) = self.cached_in_memory(now) {
            debug!("using in-memory access token");
            return Ok(token);
        }

        if let Some(token) = self.cached_on_disk(now) {
            debug!("using cached access token from disk");
            self.remember(token.clone());
            return Ok(token);
        }

        let token = self.fetch().await?;
        self.remember(token.clone());
        if let Err(e) = self.persist(&token) {
            // A cache write failure costs one extra token request next run.
            warn!(error = %e, "failed to write token cache");
        }
        Ok(token)
    }

    /// Drop any cached token, in memory and on disk.
    pub fn invalidate(&self) {
        *self.cached.write().expect("token lock poisoned") = None;
        if let Some(ref path) = self.cache_path {
            match std::fs::remove_file(path) {
                Ok(()) => debug!(path = %path.display(), "removed token cache"),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                // The rejected token would be reloaded by the next run.
                Err(e) => warn!(path = %path.display(), error = %e, "failed to remove token cache"),
            }
        }
    }

    /// Request a fresh token from the endpoint, bypassing every cache.
    pub async fn fetch(&self) -> Result<AccessToken, Error> {
        debug!("POST {}", self.token_url);

        let form = [
            ("grant_type", "client_credentials"),
            ("client_id", self.credentials.client_id.as_str()),
            (
                "client_secret",
                self.credentials.client_secret.expose_secret(),
            ),
        ];

        let resp = self
            .http
            .post(self.token_url.clone())
            .form(&form)
            .send()
            .await
            .map_err(|e| map_send_error(e, self.timeout_secs))?;

        let status = resp.status();
        if status == reqwest::StatusCode::UNAUTHORIZED
            || status == reqwest::StatusCode::BAD_REQUEST
        {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Authentication {
                message: format!("token request rejected (HTTP {status}): {body}"),
            });
        }
        if !status.is_success() {
            return Err(status_error("token", resp).await);
        }

        let body = resp
            .text()
            .await
            .map_err(|e| map_send_error(e, self.timeout_secs))?;
        let parsed: TokenResponse =
            serde_json::from_str(&body).map_err(|e| Error::deserialization(&e, &body))?;

        if parsed.access_token.is_empty() {
            return Err(Error::Authentication {
                message: "token endpoint returned an empty access_token".into(),
            });
        }

        let lifetime = effective_lifetime(self.lifetime, parsed.expires_in);
        let expires_at = Utc::now() + lifetime;
        debug!(%expires_at, "obtained access token");

        Ok(AccessToken::new(
            SecretString::from(parsed.access_token),
            expires_at,
        ))
    }

    // ── Cache helpers ────────────────────────────────────────────────

    fn cached_in_memory(&self, now: DateTime<Utc>) -> Option<AccessToken> {
        let guard = self.cached.read().expect("token lock poisoned");
        guard.as_ref().filter(|t| t.is_valid_at(now)).cloned()
    }

    fn cached_on_disk(&self, now: DateTime<Utc>) -> Option<AccessToken> {
        let path = self.cache_path.as_ref()?;
        let raw = std::fs::read_to_string(path).ok()?;
        let cached: CachedToken = match serde_json::from_str(&raw) {
            Ok(c) => c,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "ignoring unreadable token cache");
                return None;
            }
        };
        let token = AccessToken::new(SecretString::from(cached.access_token), cached.expires_at);
        token.is_valid_at(now).then_some(token)
    }

    fn remember(&self, token: AccessToken) {
        *self.cached.write().expect("token lock poisoned") = Some(token);
    }

    fn persist(&self, token: &AccessToken) -> Result<(), Error> {
        let Some(ref path) = self.cache_path else {
            return Ok(());
        };
        let doc = CachedToken {
            access_token: token.expose().to_owned(),
            expires_at: token.expires_at(),
        };
        let json = serde_json::to_vec(&doc).map_err(|e| Error::TokenCache(e.to_string()))?;
        write_private(path, &json).map_err(|e| Error::TokenCache(e.to_string()))
    }
}

/// The shorter of the configured lifetime and the server's `expires_in`.
fn effective_lifetime(configured: Duration, expires_in: Option<u64>) -> TimeDelta {
    let configured = configured.as_secs();
    let secs = expires_in.map_or(configured, |server| server.min(configured));
    TimeDelta::seconds(i64::try_from(secs).unwrap_or(i64::from(u32::MAX)))
}

/// Write `bytes` to `path` via a sibling temp file + rename, owner-only on Unix.
fn write_private(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let tmp = path.with_extension("tmp");
    let mut options = std::fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    let mut file = options.open(&tmp)?;
    file.write_all(bytes)?;
    file.sync_all()?;
    std::fs::rename(&tmp, path)
}
