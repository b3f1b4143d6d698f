// Remediation gateway: bulk soft-reset commands addressed by serial number.

mod client;
pub mod models;

pub use client::GatewayClient;
pub use models::{BulkResetRequest, BulkResetResponse, Fault};
