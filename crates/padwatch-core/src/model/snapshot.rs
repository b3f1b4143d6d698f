// ── Per-cycle device snapshots ──

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use padwatch_api::LaunchpadRecord;

use crate::error::CoreError;

/// State of one Launchpad for the current cycle. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceSnapshot {
    pub name: String,
    pub connected: bool,
    /// Badge-reader hub attached and reporting. Only meaningful while connected.
    pub hub_present: bool,
    pub docked_device_count: u32,
}

impl DeviceSnapshot {
    pub fn new(name: impl Into<String>, connected: bool, hub_present: bool, docked: u32) -> Self {
        Self {
            name: name.into(),
            connected,
            hub_present: connected && hub_present,
            docked_device_count: docked,
        }
    }
}

impl From<LaunchpadRecord> for DeviceSnapshot {
    fn from(r: LaunchpadRecord) -> Self {
        Self::new(r.name, r.connected, r.hub_connected, r.connected_device_count)
    }
}

/// Validated set of device snapshots for one cycle.
#[derive(Debug, Clone)]
pub struct FleetSnapshot {
    devices: Vec<DeviceSnapshot>,
    fetched_at: DateTime<Utc>,
}

impl FleetSnapshot {
    /// Validate a freshly fetched device list.
    ///
    /// Names must be non-empty and unique within the cycle: they key the
    /// debounce store, so a duplicate would double-count one streak.
    pub fn new(devices: Vec<DeviceSnapshot>) -> Result<Self, CoreError> {
        let mut seen = HashSet::with_capacity(devices.len());
        for d in &devices {
            if d.name.trim().is_empty() {
                return Err(CoreError::MalformedSnapshot {
                    message: "device with empty name".into(),
                });
            }
            if !seen.insert(d.name.as_str()) {
                return Err(CoreError::MalformedSnapshot {
                    message: format!("duplicate device name '{}'", d.name),
                });
            }
        }
        Ok(Self {
            devices,
            fetched_at: Utc::now(),
        })
    }

    pub fn devices(&self) -> &[DeviceSnapshot] {
        &self.devices
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    pub fn fetched_at(&self) -> DateTime<Utc> {
        self.fetched_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hub_presence_derives_from_connectivity() {
        let d = DeviceSnapshot::new("LP-01", false, true, 0);
        assert!(!d.hub_present);
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let result = FleetSnapshot::new(vec![
            DeviceSnapshot::new("LP-01", true, true, 1),
            DeviceSnapshot::new("LP-01", false, false, 0),
        ]);
        assert!(matches!(result, Err(CoreError::MalformedSnapshot { .. })));
    }

    #[test]
    fn blank_names_are_rejected() {
        let result = FleetSnapshot::new(vec![DeviceSnapshot::new("  ", true, true, 1)]);
        assert!(matches!(result, Err(CoreError::MalformedSnapshot { .. })));
    }

    #[test]
    fn record_conversion_keeps_fields() {
        let d = DeviceSnapshot::from(LaunchpadRecord {
            name: "LP-07".into(),
            connected: true,
            hub_connected: true,
            connected_device_count: 4,
        });
        assert_eq!(d.name, "LP-07");
        assert!(d.hub_present);
        assert_eq!(d.docked_device_count, 4);
    }
}
