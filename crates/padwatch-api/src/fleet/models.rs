// Wire types for the fleet API.
//
// Every field is required: a record missing one fails decoding and,
// with it, the whole fetch. Coercing absent fields to defaults would
// make an unreachable Launchpad look healthy.

use serde::{Deserialize, Serialize};

/// One Launchpad as reported by the fleet API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LaunchpadRecord {
    pub name: String,
    pub connected: bool,
    pub hub_connected: bool,
    pub connected_device_count: u32,
}

/// List envelope. Only `data` is guaranteed; the paging fields are
/// present when the backend paginates.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub data: Vec<T>,
    #[serde(default)]
    pub offset: i64,
    #[serde(default)]
    pub limit: i32,
    #[serde(default)]
    pub total_count: Option<i64>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn missing_field_is_rejected() {
        let raw = r#"{"name":"LP-01","connected":true,"connectedDeviceCount":2}"#;
        let parsed: Result<LaunchpadRecord, _> = serde_json::from_str(raw);
        assert!(parsed.is_err());
    }

    #[test]
    fn negative_device_count_is_rejected() {
        let raw = r#"{"name":"LP-01","connected":true,"hubConnected":true,"connectedDeviceCount":-1}"#;
        let parsed: Result<LaunchpadRecord, _> = serde_json::from_str(raw);
        assert!(parsed.is_err());
    }

    #[test]
    fn data_only_envelope_has_no_total() {
        let raw = r#"{"data":[{"name":"LP-01","connected":true,"hubConnected":true,"connectedDeviceCount":3}]}"#;
        let page: Page<LaunchpadRecord> = serde_json::from_str(raw).unwrap();
        assert_eq!(page.data.len(), 1);
        assert_eq!(page.total_count, None);
    }

    #[test]
    fn decodes_camel_case_record() {
        let raw = r#"{"name":"LP-01","connected":false,"hubConnected":false,"connectedDeviceCount":0}"#;
        let parsed: LaunchpadRecord = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.name, "LP-01");
        assert!(!parsed.connected);
        assert_eq!(parsed.connected_device_count, 0);
    }
}
