//! Shared helpers for command handlers.

use std::io::IsTerminal;

use tracing::warn;

use padwatch_core::{ConditionKind, SerialMap};

use crate::cli::ConditionArg;
use crate::config::Profile;
use crate::error::CliError;

/// Load the profile's serial map, or an empty one if none is configured.
///
/// An empty map means every due device is reported as unmapped.
pub fn load_serials(profile: &Profile) -> Result<SerialMap, CliError> {
    match profile.serial_map {
        Some(ref path) => Ok(SerialMap::load(path)?),
        None => {
            warn!("no serial_map configured, remediation is disabled for this profile");
            Ok(SerialMap::default())
        }
    }
}

pub fn condition_kind(arg: ConditionArg) -> ConditionKind {
    match arg {
        ConditionArg::NoHub => ConditionKind::NoHub,
        ConditionArg::NoDevices => ConditionKind::NoDevices,
    }
}

/// Prompt for confirmation, auto-approving if `--yes` was passed.
pub fn confirm(message: &str, yes_flag: bool) -> Result<bool, CliError> {
    if yes_flag {
        return Ok(true);
    }
    if !std::io::stdin().is_terminal() {
        return Err(CliError::NonInteractiveRequiresYes {
            action: message.into(),
        });
    }
    let confirmed = dialoguer::Confirm::new()
        .with_prompt(message)
        .default(false)
        .interact()
        .map_err(|e| CliError::Io(std::io::Error::other(e)))?;
    Ok(confirmed)
}
