//! Health evaluation and debounced remediation for Launchpad fleets.
//!
//! One evaluation cycle runs as a single sequential pass:
//!
//! - **[`SnapshotSource`]** supplies the current state of every Launchpad in
//!   scope. A fetch failure aborts the cycle before any state is touched.
//!
//! - **Condition evaluators** ([`evaluate`]) classify each device against
//!   every [`ConditionKind`] and advance or reset its [`DebounceRecord`].
//!
//! - **[`DebounceStore`]** persists one record per `(device, condition)`
//!   across process invocations. [`FileStore`] keeps one JSON document per
//!   key; [`MemoryStore`] backs tests and dry runs. No locking is provided:
//!   at most one cycle may run at a time.
//!
//! - **[`RemediationBatch`]** collects deduplicated serials and submits them
//!   through a [`TokenProvider`] + [`RemediationGateway`] in one call. A
//!   failed submission never rolls back `remediated` markers.
//!
//! - **[`Monitor`]** wires the above together and returns a [`CycleReport`].

pub mod batch;
pub mod config;
pub mod error;
pub mod evaluate;
pub mod model;
pub mod monitor;
pub mod report;
pub mod source;
pub mod store;

// ── Primary re-exports ──────────────────────────────────────────────
pub use batch::{RemediationBatch, RemediationOutcome, RemediationStage};
pub use config::{MonitorConfig, RemediationPolicy, TlsVerification};
pub use error::CoreError;
pub use evaluate::{Evaluation, evaluate};
pub use model::{
    ConditionKind, DebounceKey, DebounceRecord, DebouncePhase, DeviceSnapshot, FleetSnapshot,
    SerialLookup, SerialMap, SerialMapError,
};
pub use monitor::{LiveMonitor, Monitor};
pub use report::{Alert, CycleReport, CycleStatus, QueuedReset, SerialMiss, StoreFailure};
pub use source::{FleetSource, RemediationGateway, ResetSummary, SnapshotSource, TokenProvider};
pub use store::{DebounceStore, FileStore, MemoryStore, StoreError};
