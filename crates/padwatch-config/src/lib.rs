//! Configuration for the padwatch CLI.
//!
//! TOML profiles, credential resolution (env + keyring + plaintext),
//! and translation to `padwatch_core::MonitorConfig`. Paths that a
//! profile leaves unset fall back to per-profile platform directories.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use padwatch_core::{MonitorConfig, RemediationPolicy, TlsVerification};

/// Keyring service name; entries are `<profile>/<field>`.
pub const KEYRING_SERVICE: &str = "padwatch";

const DEFAULT_TOKEN_LIFETIME_SECS: u64 = 3600;

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no {field} configured for profile '{profile}'")]
    NoCredentials { profile: String, field: &'static str },

    #[error("profile '{name}' not found in config")]
    UnknownProfile { name: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    /// Profile used when `--profile` is not given.
    pub default_profile: Option<String>,

    #[serde(default)]
    pub defaults: Defaults,

    /// Named fleet profiles.
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: HashMap::new(),
        }
    }
}

impl Config {
    /// Pick a profile: the explicit name, else `default_profile`, else `"default"`.
    pub fn profile<'a>(&'a self, name: Option<&'a str>) -> Result<(&'a str, &'a Profile), ConfigError> {
        let name = name
            .or(self.default_profile.as_deref())
            .unwrap_or("default");
        self.profiles
            .get(name)
            .map(|p| (name, p))
            .ok_or_else(|| ConfigError::UnknownProfile { name: name.into() })
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_color")]
    pub color: String,

    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
            timeout: default_timeout(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_color() -> String {
    "auto".into()
}
fn default_timeout() -> u64 {
    30
}

/// One fleet: where to read device state, how to reset devices, and
/// where this profile keeps its local state.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Profile {
    /// Fleet API base URL.
    pub fleet_url: String,

    /// Ownership scope passed to the fleet listing.
    pub owner: String,

    /// Fleet API key (plaintext, prefer keyring or env var).
    pub api_key: Option<String>,

    /// Environment variable holding the fleet API key.
    pub api_key_env: Option<String>,

    /// Device-management gateway base URL.
    pub gateway_url: String,

    /// OAuth token endpoint for the gateway.
    pub token_url: String,

    pub client_id: String,

    /// OAuth client secret (plaintext, prefer keyring or env var).
    pub client_secret: Option<String>,

    pub client_secret_env: Option<String>,

    /// CSV export mapping display names to serial numbers.
    pub serial_map: Option<PathBuf>,

    /// Debounce store root.
    pub state_dir: Option<PathBuf>,

    /// Persist gateway tokens here between runs.
    pub token_cache: Option<PathBuf>,

    /// Token lifetime cap in seconds.
    pub token_lifetime: Option<u64>,

    /// Latest cycle report (JSON).
    pub status_file: Option<PathBuf>,

    /// Rolling log files and `cycles.jsonl`; file logging is off when unset.
    pub log_dir: Option<PathBuf>,

    pub ca_cert: Option<PathBuf>,

    pub insecure: Option<bool>,

    pub timeout: Option<u64>,

    #[serde(default)]
    pub policy: RemediationPolicy,
}

impl Profile {
    /// Debounce store root, defaulting to `<data dir>/<profile>/state`.
    pub fn state_dir(&self, profile_name: &str) -> PathBuf {
        self.state_dir
            .clone()
            .unwrap_or_else(|| data_dir().join(profile_name).join("state"))
    }

    /// Status artifact path, defaulting to `<data dir>/<profile>/status.json`.
    pub fn status_file(&self, profile_name: &str) -> PathBuf {
        self.status_file
            .clone()
            .unwrap_or_else(|| data_dir().join(profile_name).join("status.json"))
    }

    pub fn tls(&self) -> TlsVerification {
        if self.insecure.unwrap_or(false) {
            TlsVerification::DangerAcceptInvalid
        } else if let Some(ref ca_path) = self.ca_cert {
            TlsVerification::CustomCa(ca_path.clone())
        } else {
            TlsVerification::SystemDefaults
        }
    }
}

// ── Paths ───────────────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("com", "padwatch", "padwatch").map_or_else(
        || dirs_fallback(".config").join("config.toml"),
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

/// Per-user data directory holding profile state by default.
pub fn data_dir() -> PathBuf {
    ProjectDirs::from("com", "padwatch", "padwatch").map_or_else(
        || dirs_fallback(".local/share"),
        |dirs| dirs.data_local_dir().to_path_buf(),
    )
}

fn dirs_fallback(sub: &str) -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(sub);
    p.push("padwatch");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from `path` + environment.
///
/// Environment keys use `__` as the nesting separator, e.g.
/// `PADWATCH_PROFILES__DEFAULT__OWNER`.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("PADWATCH_").split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write it to `path`.
pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Credential resolution ───────────────────────────────────────────

/// Walk the credential chain: named env var, keyring, plaintext.
fn resolve_secret(
    profile_name: &str,
    field: &'static str,
    env_name: Option<&str>,
    plaintext: Option<&str>,
) -> Result<SecretString, ConfigError> {
    if let Some(env_name) = env_name {
        if let Ok(val) = std::env::var(env_name) {
            return Ok(SecretString::from(val));
        }
    }

    if let Ok(entry) = keyring::Entry::new(KEYRING_SERVICE, &format!("{profile_name}/{field}")) {
        if let Ok(secret) = entry.get_password() {
            return Ok(SecretString::from(secret));
        }
    }

    if let Some(value) = plaintext {
        return Ok(SecretString::from(value.to_owned()));
    }

    Err(ConfigError::NoCredentials {
        profile: profile_name.into(),
        field,
    })
}

/// Fleet API key for `profile`.
pub fn resolve_api_key(profile: &Profile, profile_name: &str) -> Result<SecretString, ConfigError> {
    resolve_secret(
        profile_name,
        "api-key",
        profile.api_key_env.as_deref(),
        profile.api_key.as_deref(),
    )
}

/// OAuth client secret for the gateway token endpoint.
pub fn resolve_client_secret(
    profile: &Profile,
    profile_name: &str,
) -> Result<SecretString, ConfigError> {
    resolve_secret(
        profile_name,
        "client-secret",
        profile.client_secret_env.as_deref(),
        profile.client_secret.as_deref(),
    )
}

// ── Translation ─────────────────────────────────────────────────────

fn parse_url(field: &str, raw: &str) -> Result<url::Url, ConfigError> {
    raw.parse().map_err(|e| ConfigError::Validation {
        field: field.into(),
        reason: format!("invalid URL '{raw}': {e}"),
    })
}

/// Build a `MonitorConfig` from a profile, resolving both secrets.
///
/// `default_timeout` applies when the profile has no `timeout` of its own.
pub fn profile_to_monitor_config(
    profile: &Profile,
    profile_name: &str,
    default_timeout: u64,
) -> Result<MonitorConfig, ConfigError> {
    let fleet_url = parse_url("fleet_url", &profile.fleet_url)?;
    let gateway_url = parse_url("gateway_url", &profile.gateway_url)?;
    let token_url = parse_url("token_url", &profile.token_url)?;

    if profile.owner.trim().is_empty() {
        return Err(ConfigError::Validation {
            field: "owner".into(),
            reason: "must not be empty".into(),
        });
    }

    profile
        .policy
        .validate()
        .map_err(|e| ConfigError::Validation {
            field: "policy".into(),
            reason: e.to_string(),
        })?;

    let timeout = profile.timeout.unwrap_or(default_timeout);
    if timeout == 0 {
        return Err(ConfigError::Validation {
            field: "timeout".into(),
            reason: "must be at least 1 second".into(),
        });
    }

    let api_key = resolve_api_key(profile, profile_name)?;
    let client_secret = resolve_client_secret(profile, profile_name)?;

    Ok(MonitorConfig {
        fleet_url,
        owner: profile.owner.clone(),
        api_key,
        gateway_url,
        token_url,
        client_id: profile.client_id.clone(),
        client_secret,
        token_cache: profile.token_cache.clone(),
        token_lifetime: Duration::from_secs(
            profile.token_lifetime.unwrap_or(DEFAULT_TOKEN_LIFETIME_SECS),
        ),
        tls: profile.tls(),
        timeout: Duration::from_secs(timeout),
        policy: profile.policy.clone(),
    })
}
