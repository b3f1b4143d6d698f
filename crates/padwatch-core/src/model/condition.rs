// ── Unhealthy condition kinds ──

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};

use super::snapshot::DeviceSnapshot;

/// An independent unhealthy condition a Launchpad can be flagged for.
///
/// The two kinds are mutually exclusive for a single snapshot: `NoDevices`
/// only applies to a connected device, `NoHub` only to a disconnected one.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    AsRefStr,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum ConditionKind {
    /// Device is unreachable; its badge-reader hub is presumed gone with it.
    NoHub,
    /// Device is connected but has nothing docked.
    NoDevices,
}

impl ConditionKind {
    /// Whether this condition holds for `device` in the current snapshot.
    pub fn holds(self, device: &DeviceSnapshot) -> bool {
        match self {
            Self::NoHub => !device.connected,
            Self::NoDevices => device.connected && device.docked_device_count < 1,
        }
    }

    /// Human-readable description used in alert lines.
    pub fn describe(self) -> &'static str {
        match self {
            Self::NoHub => "hub not connected",
            Self::NoDevices => "no docked devices",
        }
    }
}
