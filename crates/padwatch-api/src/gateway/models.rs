// Wire types for the bulk command endpoint.

use serde::{Deserialize, Serialize};

/// `{"BulkValues":{"Value":[...]}}`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct BulkResetRequest<'a> {
    pub bulk_values: BulkValues<'a>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct BulkValues<'a> {
    pub value: &'a [String],
}

impl<'a> BulkResetRequest<'a> {
    pub fn new(serials: &'a [String]) -> Self {
        Self {
            bulk_values: BulkValues { value: serials },
        }
    }
}

/// Per-item accounting returned by the gateway.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct BulkResetResponse {
    pub total_items: u32,
    pub accepted_items: u32,
    pub failed_items: u32,
    #[serde(default)]
    pub faults: Faults,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Faults {
    #[serde(default)]
    pub fault: Vec<Fault>,
}

/// A single rejected item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Fault {
    #[serde(default)]
    pub error_code: Option<i64>,
    #[serde(default)]
    pub item_value: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn request_uses_bulk_values_shape() {
        let serials = vec!["SN1".to_owned(), "SN2".to_owned()];
        let body = serde_json::to_value(BulkResetRequest::new(&serials)).unwrap();
        assert_eq!(body, serde_json::json!({"BulkValues": {"Value": ["SN1", "SN2"]}}));
    }

    #[test]
    fn faults_are_optional() {
        let raw = r#"{"TotalItems":1,"AcceptedItems":1,"FailedItems":0}"#;
        let parsed: BulkResetResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.accepted_items, 1);
        assert!(parsed.faults.fault.is_empty());
    }
}
