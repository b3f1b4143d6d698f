// ── Runtime monitor configuration ──
//
// These types describe *how* to reach the fleet API, token endpoint and
// gateway, and the remediation policy. They carry credential data but
// never touch disk: padwatch-config builds a `MonitorConfig` and hands it in.

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::CoreError;

/// TLS verification strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store (strict).
    #[default]
    SystemDefaults,
    /// Custom CA certificate file.
    CustomCa(PathBuf),
    /// Skip verification (self-signed lab gateways).
    DangerAcceptInvalid,
}

impl From<&TlsVerification> for padwatch_api::TlsMode {
    fn from(tls: &TlsVerification) -> Self {
        match tls {
            TlsVerification::SystemDefaults => Self::System,
            TlsVerification::CustomCa(path) => Self::CustomCa(path.clone()),
            TlsVerification::DangerAcceptInvalid => Self::DangerAcceptInvalid,
        }
    }
}

/// Tunable remediation policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RemediationPolicy {
    /// Consecutive unhealthy cycles required before a reset is queued.
    pub occurrences_before_action: u32,
    /// Escalate devices that are due for a reset but have no serial mapping.
    pub strict_serial_required: bool,
    /// Gateway call attempts per cycle; only transient failures are retried.
    pub gateway_attempts: u32,
}

impl Default for RemediationPolicy {
    fn default() -> Self {
        Self {
            occurrences_before_action: 2,
            strict_serial_required: false,
            gateway_attempts: 1,
        }
    }
}

impl RemediationPolicy {
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.occurrences_before_action == 0 {
            return Err(CoreError::Config {
                message: "occurrences_before_action must be at least 1".into(),
            });
        }
        if self.gateway_attempts == 0 {
            return Err(CoreError::Config {
                message: "gateway_attempts must be at least 1".into(),
            });
        }
        Ok(())
    }
}

/// Everything needed to run cycles against live services.
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// Fleet API base URL.
    pub fleet_url: Url,
    /// Ownership scope the device list is filtered to.
    pub owner: String,
    /// Fleet API key.
    pub api_key: SecretString,
    /// Remediation gateway base URL.
    pub gateway_url: Url,
    /// OAuth token endpoint.
    pub token_url: Url,
    pub client_id: String,
    pub client_secret: SecretString,
    /// Optional on-disk token cache shared between invocations.
    pub token_cache: Option<PathBuf>,
    /// Fixed upper bound on token lifetime.
    pub token_lifetime: Duration,
    /// TLS verification strategy.
    pub tls: TlsVerification,
    /// Per-request timeout for all three services.
    pub timeout: Duration,
    pub policy: RemediationPolicy,
}

impl MonitorConfig {
    pub(crate) fn transport(&self) -> padwatch_api::TransportConfig {
        padwatch_api::TransportConfig {
            tls: (&self.tls).into(),
            timeout: self.timeout,
        }
    }
}
