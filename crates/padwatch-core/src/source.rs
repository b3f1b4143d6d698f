// ── External collaborators ──
//
// The three remote services a cycle talks to, as traits, plus their live
// implementations on top of padwatch-api. Tests substitute in-memory fakes.

use std::future::Future;

use serde::{Deserialize, Serialize};

use padwatch_api::{AccessToken, FleetClient, GatewayClient, TokenClient};

use crate::error::CoreError;
use crate::model::DeviceSnapshot;

/// Supplies the current state of every device in scope.
pub trait SnapshotSource {
    fn fetch_devices(&self) -> impl Future<Output = Result<Vec<DeviceSnapshot>, CoreError>> + Send;
}

/// Supplies a usable bearer credential or fails.
pub trait TokenProvider {
    fn access_token(&self) -> impl Future<Output = Result<AccessToken, CoreError>> + Send;

    /// Forget any cached credential after the gateway refused it.
    fn invalidate(&self) {}
}

/// Accepts a batch of serials for soft reset.
pub trait RemediationGateway {
    fn submit_reset(
        &self,
        token: &AccessToken,
        serials: &[String],
    ) -> impl Future<Output = Result<ResetSummary, CoreError>> + Send;
}

/// Per-item accounting from one gateway call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResetSummary {
    pub total: u32,
    pub accepted: u32,
    pub failed: u32,
}

impl From<padwatch_api::BulkResetResponse> for ResetSummary {
    fn from(r: padwatch_api::BulkResetResponse) -> Self {
        Self {
            total: r.total_items,
            accepted: r.accepted_items,
            failed: r.failed_items,
        }
    }
}

// ── Live implementations ─────────────────────────────────────────────

/// Fleet API scoped to one owner.
pub struct FleetSource {
    client: FleetClient,
    owner: String,
}

impl FleetSource {
    pub fn new(client: FleetClient, owner: impl Into<String>) -> Self {
        Self {
            client,
            owner: owner.into(),
        }
    }
}

impl SnapshotSource for FleetSource {
    async fn fetch_devices(&self) -> Result<Vec<DeviceSnapshot>, CoreError> {
        let records = self.client.list_all_launchpads(&self.owner).await?;
        Ok(records.into_iter().map(DeviceSnapshot::from).collect())
    }
}

impl TokenProvider for TokenClient {
    async fn access_token(&self) -> Result<AccessToken, CoreError> {
        Ok(self.token().await?)
    }

    fn invalidate(&self) {
        TokenClient::invalidate(self);
    }
}

impl RemediationGateway for GatewayClient {
    async fn submit_reset(
        &self,
        token: &AccessToken,
        serials: &[String],
    ) -> Result<ResetSummary, CoreError> {
        let resp = self.bulk_soft_reset(token, serials).await?;
        Ok(resp.into())
    }
}
