//! Status artifact and per-cycle log records.
//!
//! `status_file` always holds the outcome of the latest cycle as one JSON
//! document, replaced atomically so external pollers never read a torn
//! file: a [`CycleReport`](padwatch_core::CycleReport) when the cycle completed, a [`CycleFailure`]
//! when it aborted. `<log_dir>/cycles.jsonl` accumulates one compact line
//! per cycle.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CliError;

pub const CYCLE_LOG: &str = "cycles.jsonl";

/// `status` value of a cycle that aborted before producing a report.
pub const FAILED: &str = "failed";

/// Status document for a cycle that never produced a report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CycleFailure {
    pub status: String,
    pub error: String,
    pub exit_code: i32,
    pub at: DateTime<Utc>,
}

impl CycleFailure {
    pub fn new(err: &CliError) -> Self {
        Self {
            status: FAILED.into(),
            error: err.to_string(),
            exit_code: err.exit_code(),
            at: Utc::now(),
        }
    }
}

pub fn write_status<T: Serialize + ?Sized>(path: &Path, doc: &T) -> Result<(), CliError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let body = serde_json::to_vec_pretty(doc)?;

    let tmp = path.with_extension("json.tmp");
    {
        let mut file = std::fs::File::create(&tmp)?;
        file.write_all(&body)?;
        file.sync_all()?;
    }
    std::fs::rename(&tmp, path)?;
    tracing::debug!(path = %path.display(), "status file written");
    Ok(())
}

pub fn append_cycle_log<T: Serialize + ?Sized>(log_dir: &Path, doc: &T) -> Result<(), CliError> {
    std::fs::create_dir_all(log_dir)?;
    let mut line = serde_json::to_vec(doc)?;
    line.push(b'\n');

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_dir.join(CYCLE_LOG))?;
    file.write_all(&line)?;
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use padwatch_core::{CycleReport, CycleStatus};

    use super::*;

    fn report(cycle_id: &str) -> CycleReport {
        serde_json::from_value(serde_json::json!({
            "cycle_id": cycle_id,
            "started_at": "2026-10-18T09:00:00Z",
            "finished_at": "2026-10-18T09:00:02Z",
            "status": "alerted",
            "devices_evaluated": 1,
            "alerts": [{
                "device": "LP-01",
                "condition": "no-hub",
                "occurrence_count": 1,
                "message": "LP-01: hub not connected (1 consecutive)"
            }],
            "queued": [],
            "missing_serial": [],
            "store_failures": [],
            "remediation": { "result": "skipped" }
        }))
        .unwrap()
    }

    #[test]
    fn status_file_holds_latest_report() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("status.json");

        write_status(&path, &report("6f1c1d4e-3a4b-4c5d-8e9f-000000000001")).unwrap();
        let second = report("6f1c1d4e-3a4b-4c5d-8e9f-000000000002");
        write_status(&path, &second).unwrap();

        let stored: CycleReport =
            serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
        assert_eq!(stored.cycle_id, second.cycle_id);
        assert_eq!(stored.status, CycleStatus::Alerted);
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[test]
    fn failure_replaces_previous_report() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("status.json");
        write_status(&path, &report("6f1c1d4e-3a4b-4c5d-8e9f-000000000001")).unwrap();

        let err = CliError::ApiError {
            message: "HTTP 500: fleet: internal error".into(),
        };
        write_status(&path, &CycleFailure::new(&err)).unwrap();

        let stored: serde_json::Value =
            serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
        assert_eq!(stored["status"], FAILED);
        assert_eq!(stored["exit_code"], 1);
        assert!(stored["error"].as_str().unwrap().contains("HTTP 500"));
        assert!(stored.get("cycle_id").is_none());
    }

    #[test]
    fn cycle_log_appends_one_line_per_cycle() {
        let dir = tempfile::tempdir().unwrap();
        for n in 1..=3 {
            let id = format!("6f1c1d4e-3a4b-4c5d-8e9f-00000000000{n}");
            append_cycle_log(dir.path(), &report(&id)).unwrap();
        }
        let raw = std::fs::read_to_string(dir.path().join(CYCLE_LOG)).unwrap();
        assert_eq!(raw.lines().count(), 3);
        for line in raw.lines() {
            let parsed: CycleReport = serde_json::from_str(line).unwrap();
            assert_eq!(parsed.alerts.len(), 1);
        }
    }
}
