// Async client for the fleet API.
//
// Base path: {fleet_url}/v1/
// Auth: X-API-KEY header

use reqwest::header::{HeaderMap, HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use super::models::{LaunchpadRecord, Page};
use crate::error::Error;
use crate::transport::{TransportConfig, map_send_error, status_error};

/// Page size used by [`FleetClient::list_all_launchpads`].
const PAGE_LIMIT: i32 = 200;

/// Async client for the fleet device-listing API.
pub struct FleetClient {
    http: reqwest::Client,
    base_url: Url,
    timeout_secs: u64,
}

impl FleetClient {
    /// Build from an API key and transport config.
    ///
    /// Injects `X-API-KEY` as a default header on every request.
    pub fn from_api_key(
        base_url: &str,
        api_key: &SecretString,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let mut headers = HeaderMap::new();
        let mut key_value =
            HeaderValue::from_str(api_key.expose_secret()).map_err(|e| Error::Authentication {
                message: format!("invalid API key header value: {e}"),
            })?;
        key_value.set_sensitive(true);
        headers.insert("X-API-KEY", key_value);

        let http = transport.build_client_with_headers(headers)?;
        let mut client = Self::from_reqwest(base_url, http)?;
        client.timeout_secs = transport.timeout_secs();
        Ok(client)
    }

    /// Wrap an existing `reqwest::Client` (caller manages auth headers).
    pub fn from_reqwest(base_url: &str, http: reqwest::Client) -> Result<Self, Error> {
        let base_url = Self::normalize_base_url(base_url)?;
        Ok(Self {
            http,
            base_url,
            timeout_secs: 30,
        })
    }

    /// Ensure the base URL ends in `/` so relative joins keep its path.
    fn normalize_base_url(raw: &str) -> Result<Url, Error> {
        let mut url = Url::parse(raw)?;
        let path = url.path().trim_end_matches('/').to_owned();
        url.set_path(&format!("{path}/"));
        Ok(url)
    }

    fn url(&self, path: &str) -> Result<Url, Error> {
        Ok(self.base_url.join(path)?)
    }

    async fn get_with_params<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<T, Error> {
        let url = self.url(path)?;
        debug!("GET {url} params={params:?}");

        let resp = self
            .http
            .get(url)
            .query(params)
            .send()
            .await
            .map_err(|e| map_send_error(e, self.timeout_secs))?;

        let status = resp.status();
        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(Error::InvalidApiKey);
        }
        if !status.is_success() {
            return Err(status_error("fleet", resp).await);
        }

        let body = resp
            .text()
            .await
            .map_err(|e| map_send_error(e, self.timeout_secs))?;
        serde_json::from_str(&body).map_err(|e| Error::deserialization(&e, &body))
    }

    // ── Public API ───────────────────────────────────────────────────

    /// Fetch one page of Launchpads owned by `owner`.
    pub async fn list_launchpads(
        &self,
        owner: &str,
        offset: i64,
        limit: i32,
    ) -> Result<Page<LaunchpadRecord>, Error> {
        self.get_with_params(
            "v1/launchpads",
            &[
                ("owner", owner.to_owned()),
                ("offset", offset.to_string()),
                ("limit", limit.to_string()),
            ],
        )
        .await
    }

    /// Fetch every Launchpad owned by `owner`, following pagination.
    pub async fn list_all_launchpads(&self, owner: &str) -> Result<Vec<LaunchpadRecord>, Error> {
        let mut all = Vec::new();
        let mut offset: i64 = 0;

        loop {
            let page = self.list_launchpads(owner, offset, PAGE_LIMIT).await?;
            let received = page.data.len();
            all.extend(page.data);

            let limit_usize = usize::try_from(PAGE_LIMIT).unwrap_or(0);
            // Without a total, a short page is the last one.
            let reached_total = page
                .total_count
                .is_some_and(|total| i64::try_from(all.len()).unwrap_or(i64::MAX) >= total);
            if received == 0 || received < limit_usize || reached_total {
                break;
            }

            offset += i64::try_from(received).unwrap_or(i64::MAX);
        }

        debug!(count = all.len(), owner, "fetched launchpads");
        Ok(all)
    }
}
