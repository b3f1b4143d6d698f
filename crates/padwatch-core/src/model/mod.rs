// ── Domain model ──

pub mod condition;
pub mod debounce;
pub mod serial;
pub mod snapshot;

pub use condition::ConditionKind;
pub use debounce::{DebounceKey, DebouncePhase, DebounceRecord};
pub use serial::{SerialLookup, SerialMap, SerialMapError};
pub use snapshot::{DeviceSnapshot, FleetSnapshot};
