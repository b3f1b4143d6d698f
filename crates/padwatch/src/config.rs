//! CLI configuration: thin wrapper around `padwatch_config`.
//!
//! Adds `--config` / `--profile` resolution and the flag overrides
//! (`--insecure`, `--timeout`) on top of the shared crate.

use std::path::PathBuf;

use padwatch_core::MonitorConfig;

use crate::cli::GlobalOpts;
use crate::error::CliError;

pub use padwatch_config::{Config, Profile, save_config_to};

/// Config file in effect: `--config` if given, else the platform default.
pub fn config_path(global: &GlobalOpts) -> PathBuf {
    global
        .config
        .clone()
        .unwrap_or_else(padwatch_config::config_path)
}

pub fn load(global: &GlobalOpts) -> Result<Config, CliError> {
    Ok(padwatch_config::load_config_from(&config_path(global))?)
}

/// Resolve the active profile from `--profile` and `default_profile`.
pub fn active_profile<'a>(
    global: &'a GlobalOpts,
    cfg: &'a Config,
) -> Result<(&'a str, &'a Profile), CliError> {
    if cfg.profiles.is_empty() {
        return Err(CliError::NoConfig {
            path: config_path(global).display().to_string(),
        });
    }
    cfg.profile(global.profile.as_deref()).map_err(|_| {
        let mut names: Vec<_> = cfg.profiles.keys().map(String::as_str).collect();
        names.sort_unstable();
        CliError::ProfileNotFound {
            name: global
                .profile
                .clone()
                .or_else(|| cfg.default_profile.clone())
                .unwrap_or_else(|| "default".into()),
            available: names.join(", "),
        }
    })
}

/// Build the runtime config, letting global flags override the profile.
pub fn monitor_config(
    global: &GlobalOpts,
    cfg: &Config,
    profile_name: &str,
    profile: &Profile,
) -> Result<MonitorConfig, CliError> {
    let mut profile = profile.clone();
    if global.insecure {
        profile.insecure = Some(true);
    }
    if let Some(timeout) = global.timeout {
        profile.timeout = Some(timeout);
    }
    Ok(padwatch_config::profile_to_monitor_config(
        &profile,
        profile_name,
        cfg.defaults.timeout,
    )?)
}
