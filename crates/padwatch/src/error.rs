//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with
//! actionable help text and a stable process exit code.

use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

use padwatch_config::ConfigError;
use padwatch_core::{CoreError, SerialMapError, StoreError};

/// Process exit codes. Scripts and timers rely on these staying stable.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
    pub const LOCKED: i32 = 9;
    pub const UNRESOLVED: i32 = 10;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────

    #[error("Could not reach {url}: {reason}")]
    #[diagnostic(
        code(padwatch::connection_failed),
        help(
            "Check network access to the fleet API, token endpoint and gateway.\n\
             For lab gateways with self-signed certificates set ca_cert or use --insecure."
        )
    )]
    ConnectionFailed { url: String, reason: String },

    #[error("Request timed out after {seconds}s")]
    #[diagnostic(
        code(padwatch::timeout),
        help("Increase the timeout with --timeout or in the profile.")
    )]
    Timeout { seconds: u64 },

    // ── Authentication ───────────────────────────────────────────────

    #[error("Authentication failed: {message}")]
    #[diagnostic(
        code(padwatch::auth_failed),
        help("Verify the fleet API key and the gateway client credentials for this profile.")
    )]
    AuthFailed { message: String },

    #[error("No {field} configured for profile '{profile}'")]
    #[diagnostic(
        code(padwatch::no_credentials),
        help(
            "Point api_key_env / client_secret_env at an environment variable,\n\
             store the secret in the system keyring as padwatch/{profile}/{field},\n\
             or put it in the config file."
        )
    )]
    NoCredentials { profile: String, field: String },

    // ── Remote data ──────────────────────────────────────────────────

    #[error("Fleet returned an unusable snapshot: {message}")]
    #[diagnostic(
        code(padwatch::malformed_snapshot),
        help("No state was changed. The next check will try again.")
    )]
    MalformedSnapshot { message: String },

    #[error("API error: {message}")]
    #[diagnostic(code(padwatch::api_error))]
    ApiError { message: String },

    // ── Local state ──────────────────────────────────────────────────

    #[error("Another check is already running (lock held on {path})")]
    #[diagnostic(
        code(padwatch::locked),
        help("Wait for it to finish. Only one cycle may run per state directory.")
    )]
    Locked { path: PathBuf },

    #[error(transparent)]
    #[diagnostic(code(padwatch::state))]
    Store(#[from] StoreError),

    #[error(transparent)]
    #[diagnostic(
        code(padwatch::serial_map),
        help("Check the serial_map file configured for this profile.")
    )]
    SerialMap(#[from] SerialMapError),

    #[error("{resource_type} '{identifier}' not found")]
    #[diagnostic(
        code(padwatch::not_found),
        help("Run: padwatch {list_command} to see what exists")
    )]
    NotFound {
        resource_type: String,
        identifier: String,
        list_command: String,
    },

    #[error("{count} device(s) are due for a reset but have no serial mapping")]
    #[diagnostic(
        code(padwatch::unresolved_serials),
        help(
            "Devices: {devices}\n\
             Add them to the serial map, or disable policy.strict_serial_required."
        )
    )]
    UnresolvedSerials { count: usize, devices: String },

    // ── Validation ───────────────────────────────────────────────────

    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(padwatch::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────

    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(padwatch::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Create one with: padwatch config init"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error("Configuration file not found")]
    #[diagnostic(
        code(padwatch::no_config),
        help(
            "Create one with: padwatch config init\n\
             Expected at: {path}"
        )
    )]
    NoConfig { path: String },

    #[error(transparent)]
    #[diagnostic(code(padwatch::config))]
    Config(Box<figment::Error>),

    #[error("Could not save configuration: {message}")]
    #[diagnostic(code(padwatch::config_save))]
    ConfigSave { message: String },

    // ── Interactive ──────────────────────────────────────────────────

    #[error("Destructive operation '{action}' requires confirmation")]
    #[diagnostic(
        code(padwatch::confirmation_required),
        help("Use --yes (-y) to skip confirmation in non-interactive contexts.")
    )]
    NonInteractiveRequiresYes { action: String },

    // ── IO / Serialization ───────────────────────────────────────────

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Could not encode output: {0}")]
    #[diagnostic(code(padwatch::json))]
    Json(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    #[diagnostic(code(padwatch::internal))]
    Internal(String),
}

impl From<figment::Error> for CliError {
    fn from(err: figment::Error) -> Self {
        Self::Config(Box::new(err))
    }
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::Timeout { .. } => exit_code::TIMEOUT,
            Self::AuthFailed { .. } | Self::NoCredentials { .. } => exit_code::AUTH,
            Self::NotFound { .. } => exit_code::NOT_FOUND,
            Self::Locked { .. } => exit_code::LOCKED,
            Self::UnresolvedSerials { .. } => exit_code::UNRESOLVED,
            Self::Validation { .. } | Self::NonInteractiveRequiresYes { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ConnectionFailed { url, reason } => Self::ConnectionFailed { url, reason },
            CoreError::AuthenticationFailed { message } => Self::AuthFailed { message },
            CoreError::Timeout { timeout_secs } => Self::Timeout {
                seconds: timeout_secs,
            },
            CoreError::MalformedSnapshot { message } | CoreError::MalformedResponse { message } => {
                Self::MalformedSnapshot { message }
            }
            CoreError::SerialMap(e) => Self::SerialMap(e),
            CoreError::Store(e) => Self::Store(e),
            CoreError::Api { message, status } => Self::ApiError {
                message: match status {
                    Some(code) => format!("HTTP {code}: {message}"),
                    None => message,
                },
            },
            CoreError::Config { message } => Self::Validation {
                field: "profile".into(),
                reason: message,
            },
            CoreError::Internal(message) => Self::Internal(message),
        }
    }
}

// ── ConfigError → CliError mapping ───────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => Self::Validation { field, reason },
            ConfigError::NoCredentials { profile, field } => Self::NoCredentials {
                profile,
                field: field.into(),
            },
            ConfigError::UnknownProfile { name } => Self::ProfileNotFound {
                name,
                available: String::new(),
            },
            ConfigError::Serialization(e) => Self::ConfigSave {
                message: e.to_string(),
            },
            ConfigError::Figment(e) => Self::Config(e),
            ConfigError::Io(e) => Self::Io(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lock_and_strict_policy_have_dedicated_codes() {
        let locked = CliError::Locked {
            path: PathBuf::from("/var/lib/padwatch/cycle.lock"),
        };
        assert_eq!(locked.exit_code(), exit_code::LOCKED);

        let unresolved = CliError::UnresolvedSerials {
            count: 1,
            devices: "LP-07".into(),
        };
        assert_eq!(unresolved.exit_code(), exit_code::UNRESOLVED);
    }

    #[test]
    fn core_errors_keep_their_category() {
        let err: CliError = CoreError::Timeout { timeout_secs: 5 }.into();
        assert_eq!(err.exit_code(), exit_code::TIMEOUT);

        let err: CliError = CoreError::AuthenticationFailed {
            message: "invalid_client".into(),
        }
        .into();
        assert_eq!(err.exit_code(), exit_code::AUTH);

        let err: CliError = CoreError::ConnectionFailed {
            url: "https://fleet.test".into(),
            reason: "refused".into(),
        }
        .into();
        assert_eq!(err.exit_code(), exit_code::CONNECTION);
    }

    #[test]
    fn missing_credentials_are_an_auth_failure() {
        let err: CliError = ConfigError::NoCredentials {
            profile: "lobby".into(),
            field: "api-key",
        }
        .into();
        assert_eq!(err.exit_code(), exit_code::AUTH);
    }
}
