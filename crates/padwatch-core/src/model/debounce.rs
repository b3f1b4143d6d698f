// ── Debounce state ──
//
// One record per (device, condition). Created on the first unhealthy
// observation, advanced on every consecutive one, deleted on recovery.
// `remediated` is only ever cleared together with the counter.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::condition::ConditionKind;

/// Composite key for the debounce store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DebounceKey {
    pub device: String,
    pub condition: ConditionKind,
}

impl DebounceKey {
    pub fn new(device: impl Into<String>, condition: ConditionKind) -> Self {
        Self {
            device: device.into(),
            condition,
        }
    }
}

impl fmt::Display for DebounceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.device, self.condition)
    }
}

/// Persistent streak state for one key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DebounceRecord {
    /// Consecutive cycles the condition has held without a recovery.
    pub occurrence_count: u32,
    /// A remediation has been queued for this streak.
    pub remediated: bool,
}

impl DebounceRecord {
    /// Record for the first unhealthy observation of a streak.
    pub fn first() -> Self {
        Self {
            occurrence_count: 1,
            remediated: false,
        }
    }

    /// Advance an existing streak by one cycle.
    #[must_use]
    pub fn advanced(self) -> Self {
        Self {
            occurrence_count: self.occurrence_count.saturating_add(1),
            ..self
        }
    }

    #[must_use]
    pub fn mark_remediated(self) -> Self {
        Self {
            remediated: true,
            ..self
        }
    }

    /// Where this record sits in the per-key state machine.
    pub fn phase(&self, threshold: u32) -> DebouncePhase {
        if self.remediated {
            DebouncePhase::Remediated
        } else if self.occurrence_count >= threshold {
            DebouncePhase::Due
        } else {
            DebouncePhase::Flagged
        }
    }
}

/// Coarse state of a `(device, condition)` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum DebouncePhase {
    /// No record: condition not observed, or recovered.
    Healthy,
    /// Observed, below the action threshold.
    Flagged,
    /// At or past the threshold but not yet remediated (e.g. no serial).
    Due,
    /// Remediation queued; terminal until recovery.
    Remediated,
}

impl DebouncePhase {
    pub fn of(record: Option<&DebounceRecord>, threshold: u32) -> Self {
        record.map_or(Self::Healthy, |r| r.phase(threshold))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advancing_keeps_remediated_flag() {
        let r = DebounceRecord::first().advanced().mark_remediated().advanced();
        assert_eq!(r.occurrence_count, 3);
        assert!(r.remediated);
    }

    #[test]
    fn phases_follow_threshold() {
        assert_eq!(DebouncePhase::of(None, 2), DebouncePhase::Healthy);
        let r = DebounceRecord::first();
        assert_eq!(r.phase(2), DebouncePhase::Flagged);
        assert_eq!(r.advanced().phase(2), DebouncePhase::Due);
        assert_eq!(r.advanced().mark_remediated().phase(2), DebouncePhase::Remediated);
    }

    #[test]
    fn counter_saturates() {
        let r = DebounceRecord {
            occurrence_count: u32::MAX,
            remediated: true,
        };
        assert_eq!(r.advanced().occurrence_count, u32::MAX);
    }

    #[test]
    fn key_display() {
        let key = DebounceKey::new("LP-01", ConditionKind::NoHub);
        assert_eq!(key.to_string(), "LP-01/no-hub");
    }
}
