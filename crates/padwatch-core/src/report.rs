// ── Cycle report ──
//
// Everything a cycle produced, in one serializable document. The CLI
// renders it, writes it as the status artifact, and appends it to the
// cycle log.

use chrono::{DateTime, Utc};
use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::batch::RemediationOutcome;
use crate::model::ConditionKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum CycleStatus {
    Healthy,
    Alerted,
}

/// One condition-positive device. Emitted from the first occurrence on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alert {
    pub device: String,
    pub condition: ConditionKind,
    /// `None` when the store could not be read for this device.
    pub occurrence_count: Option<u32>,
    pub message: String,
}

impl Alert {
    pub(crate) fn new(device: &str, condition: ConditionKind, count: Option<u32>) -> Self {
        let message = match count {
            Some(n) => format!("{device}: {} ({n} consecutive)", condition.describe()),
            None => format!("{device}: {} (streak unknown)", condition.describe()),
        };
        Self {
            device: device.to_owned(),
            condition,
            occurrence_count: count,
            message,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueuedReset {
    pub device: String,
    pub condition: ConditionKind,
    pub serial: String,
}

/// A device due for a reset that has no serial mapping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerialMiss {
    pub device: String,
    pub condition: ConditionKind,
    pub occurrence_count: u32,
}

/// A device whose evaluation was abandoned because the store failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreFailure {
    pub device: String,
    pub condition: ConditionKind,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CycleReport {
    pub cycle_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub status: CycleStatus,
    pub devices_evaluated: usize,
    pub alerts: Vec<Alert>,
    pub queued: Vec<QueuedReset>,
    pub missing_serial: Vec<SerialMiss>,
    pub store_failures: Vec<StoreFailure>,
    pub remediation: RemediationOutcome,
}

impl CycleReport {
    pub(crate) fn begin() -> Self {
        let now = Utc::now();
        Self {
            cycle_id: Uuid::new_v4(),
            started_at: now,
            finished_at: now,
            status: CycleStatus::Healthy,
            devices_evaluated: 0,
            alerts: Vec::new(),
            queued: Vec::new(),
            missing_serial: Vec::new(),
            store_failures: Vec::new(),
            remediation: RemediationOutcome::Skipped,
        }
    }

    pub(crate) fn finish(&mut self, remediation: RemediationOutcome) {
        self.remediation = remediation;
        self.status = if self.alerts.is_empty() {
            CycleStatus::Healthy
        } else {
            CycleStatus::Alerted
        };
        self.finished_at = Utc::now();
    }

    /// Unique serials actually queued this cycle.
    pub fn queued_serials(&self) -> Vec<&str> {
        self.queued
            .iter()
            .map(|q| q.serial.as_str())
            .collect::<IndexSet<_>>()
            .into_iter()
            .collect()
    }

    pub fn has_unresolved_serials(&self) -> bool {
        !self.missing_serial.is_empty()
    }

    /// Alert lines in emission order.
    pub fn alert_lines(&self) -> impl Iterator<Item = &str> {
        self.alerts.iter().map(|a| a.message.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_follows_alerts() {
        let mut report = CycleReport::begin();
        report.finish(RemediationOutcome::Skipped);
        assert_eq!(report.status, CycleStatus::Healthy);

        let mut report = CycleReport::begin();
        report
            .alerts
            .push(Alert::new("LP-01", ConditionKind::NoHub, Some(1)));
        report.finish(RemediationOutcome::Skipped);
        assert_eq!(report.status, CycleStatus::Alerted);
        assert!(report.finished_at >= report.started_at);
    }

    #[test]
    fn queued_serials_are_unique_in_first_seen_order() {
        let mut report = CycleReport::begin();
        for (device, serial) in [("X", "SN-2"), ("Y", "SN-1"), ("Z", "SN-2"), ("W", "SN-1")] {
            report.queued.push(QueuedReset {
                device: device.into(),
                condition: ConditionKind::NoHub,
                serial: serial.into(),
            });
        }
        assert_eq!(report.queued_serials(), vec!["SN-2", "SN-1"]);
    }

    #[test]
    fn alert_message_mentions_device_and_condition() {
        let alert = Alert::new("LP-09", ConditionKind::NoDevices, Some(3));
        assert_eq!(alert.message, "LP-09: no docked devices (3 consecutive)");
    }
}
