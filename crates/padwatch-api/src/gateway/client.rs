// Async client for the remediation gateway's bulk command endpoint.
//
// Auth: `Authorization: Bearer <token>` obtained from [`TokenClient`].
//
// [`TokenClient`]: crate::auth::TokenClient

use tracing::{debug, warn};
use url::Url;

use super::models::{BulkResetRequest, BulkResetResponse};
use crate::auth::AccessToken;
use crate::error::Error;
use crate::transport::{TransportConfig, map_send_error, status_error};

const BULK_PATH: &str = "api/mdm/devices/commands/bulk";

/// Client for issuing soft resets to batches of devices.
pub struct GatewayClient {
    http: reqwest::Client,
    base_url: Url,
    timeout_secs: u64,
}

impl GatewayClient {
    pub fn new(base_url: &str, transport: &TransportConfig) -> Result<Self, Error> {
        let http = transport.build_client()?;
        let mut client = Self::with_client(base_url, http)?;
        client.timeout_secs = transport.timeout_secs();
        Ok(client)
    }

    /// Wrap an existing `reqwest::Client`.
    pub fn with_client(base_url: &str, http: reqwest::Client) -> Result<Self, Error> {
        let mut url = Url::parse(base_url)?;
        let path = url.path().trim_end_matches('/').to_owned();
        url.set_path(&format!("{path}/"));
        Ok(Self {
            http,
            base_url: url,
            timeout_secs: 30,
        })
    }

    /// Issue one soft-reset command for every serial in `serials`.
    ///
    /// The caller is responsible for deduplicating `serials`; the gateway's
    /// behaviour for repeated values within one request is undefined.
    pub async fn bulk_soft_reset(
        &self,
        token: &AccessToken,
        serials: &[String],
    ) -> Result<BulkResetResponse, Error> {
        let url = self.base_url.join(BULK_PATH)?;
        debug!("POST {url} items={}", serials.len());

        let resp = self
            .http
            .post(url)
            .query(&[("command", "SoftReset"), ("searchby", "Serialnumber")])
            .bearer_auth(token.expose())
            .header(reqwest::header::ACCEPT, "application/json")
            .json(&BulkResetRequest::new(serials))
            .send()
            .await
            .map_err(|e| map_send_error(e, self.timeout_secs))?;

        let status = resp.status();
        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(Error::Authentication {
                message: "gateway rejected the bearer token".into(),
            });
        }
        if !status.is_success() {
            return Err(status_error("gateway", resp).await);
        }

        let body = resp
            .text()
            .await
            .map_err(|e| map_send_error(e, self.timeout_secs))?;
        let parsed: BulkResetResponse =
            serde_json::from_str(&body).map_err(|e| Error::deserialization(&e, &body))?;

        for fault in &parsed.faults.fault {
            warn!(
                serial = fault.item_value.as_deref().unwrap_or("-"),
                code = ?fault.error_code,
                message = fault.message.as_deref().unwrap_or("-"),
                "gateway rejected item"
            );
        }

        Ok(parsed)
    }
}
