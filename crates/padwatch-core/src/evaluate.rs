// ── Condition evaluators ──
//
// Pure step function for one (device, condition) pair: given this cycle's
// snapshot and the persisted record, produce the next record and whether a
// reset is due. No I/O happens here; `Monitor` applies the result.

use crate::model::{ConditionKind, DebounceRecord, DeviceSnapshot};

/// Result of evaluating one condition against one device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Evaluation {
    pub condition: ConditionKind,
    /// The condition holds this cycle.
    pub holds: bool,
    /// Record to persist. `None` means delete: the device has recovered
    /// (or was never flagged).
    pub record: Option<DebounceRecord>,
    /// Threshold reached and no reset issued yet for this streak.
    pub should_remediate: bool,
}

/// Advance the debounce state machine for one `(device, condition)`.
///
/// - Condition false: full reset, whatever the prior count.
/// - Condition true, no record: start a streak at 1.
/// - Condition true, record: increment.
///
/// `should_remediate` is `count >= threshold && !remediated`, so a streak
/// triggers at most one reset until it is broken by a recovery.
pub fn evaluate(
    condition: ConditionKind,
    device: &DeviceSnapshot,
    current: Option<DebounceRecord>,
    threshold: u32,
) -> Evaluation {
    if !condition.holds(device) {
        return Evaluation {
            condition,
            holds: false,
            record: None,
            should_remediate: false,
        };
    }

    let record = current.map_or_else(DebounceRecord::first, DebounceRecord::advanced);
    Evaluation {
        condition,
        holds: true,
        record: Some(record),
        should_remediate: record.occurrence_count >= threshold && !record.remediated,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const THRESHOLD: u32 = 2;

    fn offline() -> DeviceSnapshot {
        DeviceSnapshot::new("LP-01", false, false, 0)
    }

    fn online(docked: u32) -> DeviceSnapshot {
        DeviceSnapshot::new("LP-01", true, true, docked)
    }

    #[test]
    fn first_observation_creates_record_without_action() {
        let eval = evaluate(ConditionKind::NoHub, &offline(), None, THRESHOLD);
        assert!(eval.holds);
        assert_eq!(eval.record, Some(DebounceRecord::first()));
        assert!(!eval.should_remediate);
    }

    #[test]
    fn second_consecutive_observation_triggers() {
        let eval = evaluate(
            ConditionKind::NoHub,
            &offline(),
            Some(DebounceRecord::first()),
            THRESHOLD,
        );
        assert_eq!(eval.record.map(|r| r.occurrence_count), Some(2));
        assert!(eval.should_remediate);
    }

    #[test]
    fn remediated_streak_never_triggers_again() {
        let mut record = DebounceRecord::first().advanced().mark_remediated();
        for _ in 0..10 {
            let eval = evaluate(ConditionKind::NoHub, &offline(), Some(record), THRESHOLD);
            assert!(!eval.should_remediate);
            record = eval.record.unwrap_or_else(DebounceRecord::first);
            assert!(record.remediated);
        }
        assert_eq!(record.occurrence_count, 12);
    }

    #[test]
    fn recovery_fully_resets() {
        let record = DebounceRecord::first().advanced().advanced().mark_remediated();
        let eval = evaluate(ConditionKind::NoHub, &online(3), Some(record), THRESHOLD);
        assert!(!eval.holds);
        assert_eq!(eval.record, None);
        assert!(!eval.should_remediate);

        // A new streak starts over at one.
        let eval = evaluate(ConditionKind::NoHub, &offline(), eval.record, THRESHOLD);
        assert_eq!(eval.record, Some(DebounceRecord::first()));
    }

    #[test]
    fn unremediated_streak_past_threshold_stays_due() {
        // Serial was missing for a few cycles: count grew, flag never set.
        let record = DebounceRecord {
            occurrence_count: 5,
            remediated: false,
        };
        let eval = evaluate(ConditionKind::NoDevices, &online(0), Some(record), THRESHOLD);
        assert_eq!(eval.record.map(|r| r.occurrence_count), Some(6));
        assert!(eval.should_remediate);
    }

    #[test]
    fn threshold_of_one_acts_immediately() {
        let eval = evaluate(ConditionKind::NoDevices, &online(0), None, 1);
        assert!(eval.should_remediate);
    }

    #[test]
    fn larger_threshold_waits() {
        let mut record = None;
        let mut fired_at = None;
        for cycle in 1..=5 {
            let eval = evaluate(ConditionKind::NoHub, &offline(), record, 3);
            if eval.should_remediate {
                fired_at.get_or_insert(cycle);
                record = eval.record.map(DebounceRecord::mark_remediated);
            } else {
                record = eval.record;
            }
        }
        assert_eq!(fired_at, Some(3));
    }
}
