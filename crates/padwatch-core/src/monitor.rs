// ── Cycle orchestration ──
//
// fetch → evaluate every (device, condition) → submit batch → report.
// Strictly sequential. The only fatal failures are the ones that happen
// before any state is touched (fetch, snapshot validation); after that,
// problems are contained to the device or the batch they affect.

use strum::IntoEnumIterator;
use tracing::{debug, error, info, warn};

use padwatch_api::{ClientCredentials, FleetClient, GatewayClient, TokenClient};

use crate::batch::{RemediationBatch, RemediationOutcome};
use crate::config::{MonitorConfig, RemediationPolicy};
use crate::error::CoreError;
use crate::evaluate::evaluate;
use crate::model::{ConditionKind, DebounceKey, DeviceSnapshot, FleetSnapshot, SerialLookup};
use crate::report::{Alert, CycleReport, QueuedReset, SerialMiss, StoreFailure};
use crate::source::{FleetSource, RemediationGateway, SnapshotSource, TokenProvider};
use crate::store::{DebounceStore, StoreError};

/// Monitor wired to the live fleet API, token endpoint and gateway.
pub type LiveMonitor = Monitor<FleetSource, TokenClient, GatewayClient>;

/// Runs evaluation cycles against a snapshot source and remediation gateway.
pub struct Monitor<S, A, G> {
    source: S,
    auth: A,
    gateway: G,
    policy: RemediationPolicy,
    dry_run: bool,
}

impl LiveMonitor {
    /// Build the live clients from a [`MonitorConfig`].
    pub fn from_config(config: &MonitorConfig) -> Result<Self, CoreError> {
        let transport = config.transport();

        let fleet = FleetClient::from_api_key(config.fleet_url.as_str(), &config.api_key, &transport)?;
        let source = FleetSource::new(fleet, config.owner.clone());

        let mut auth = TokenClient::new(
            config.token_url.clone(),
            ClientCredentials {
                client_id: config.client_id.clone(),
                client_secret: config.client_secret.clone(),
            },
            &transport,
        )?
        .with_lifetime(config.token_lifetime);
        if let Some(ref path) = config.token_cache {
            auth = auth.with_cache_file(path);
        }

        let gateway = GatewayClient::new(config.gateway_url.as_str(), &transport)?;

        Self::new(source, auth, gateway, config.policy.clone())
    }
}

impl<S, A, G> Monitor<S, A, G>
where
    S: SnapshotSource + Sync,
    A: TokenProvider + Sync,
    G: RemediationGateway + Sync,
{
    pub fn new(source: S, auth: A, gateway: G, policy: RemediationPolicy) -> Result<Self, CoreError> {
        policy.validate()?;
        Ok(Self {
            source,
            auth,
            gateway,
            policy,
            dry_run: false,
        })
    }

    /// Build and report the batch but never call the token endpoint or gateway.
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Run one full cycle.
    ///
    /// Returns `Err` only for failures before evaluation starts, in which
    /// case `store` has not been modified. Per-device store errors and
    /// gateway failures are recorded in the returned report instead.
    pub async fn run_cycle(
        &self,
        store: &dyn DebounceStore,
        serials: &dyn SerialLookup,
    ) -> Result<CycleReport, CoreError> {
        let mut report = CycleReport::begin();
        info!(cycle = %report.cycle_id, "starting cycle");

        let devices = self.source.fetch_devices().await.inspect_err(|e| {
            error!(cycle = %report.cycle_id, error = %e, "snapshot fetch failed, aborting cycle");
        })?;
        let snapshot = FleetSnapshot::new(devices)?;
        debug!(devices = snapshot.len(), "snapshot validated");

        let mut batch = RemediationBatch::new();
        for device in snapshot.devices() {
            for condition in ConditionKind::iter() {
                self.evaluate_condition(device, condition, store, serials, &mut batch, &mut report);
            }
        }
        report.devices_evaluated = snapshot.len();

        let outcome = if batch.is_empty() {
            RemediationOutcome::Skipped
        } else if self.dry_run {
            info!(would_reset = batch.len(), "dry run, not submitting batch");
            RemediationOutcome::DryRun {
                would_reset: batch.len(),
            }
        } else {
            info!(queued = batch.len(), "submitting remediation batch");
            batch
                .submit(&self.auth, &self.gateway, self.policy.gateway_attempts)
                .await
        };

        report.finish(outcome);
        info!(
            cycle = %report.cycle_id,
            status = %report.status,
            alerts = report.alerts.len(),
            queued = batch.len(),
            "cycle complete"
        );
        Ok(report)
    }

    /// Evaluate one `(device, condition)` and apply the result to the store,
    /// batch and report.
    fn evaluate_condition(
        &self,
        device: &DeviceSnapshot,
        condition: ConditionKind,
        store: &dyn DebounceStore,
        serials: &dyn SerialLookup,
        batch: &mut RemediationBatch,
        report: &mut CycleReport,
    ) {
        let key = DebounceKey::new(device.name.as_str(), condition);

        let current = match store.get(&key) {
            Ok(current) => current,
            Err(e) => {
                // Uncertain state: never remediate on it, but still alert.
                if condition.holds(device) {
                    report.alerts.push(Alert::new(&device.name, condition, None));
                }
                record_store_failure(report, &key, &e);
                return;
            }
        };

        let eval = evaluate(condition, device, current, self.policy.occurrences_before_action);

        let Some(mut record) = eval.record else {
            if current.is_some() {
                debug!(%key, "condition cleared, resetting streak");
                if let Err(e) = store.clear(&key) {
                    record_store_failure(report, &key, &e);
                }
            }
            return;
        };

        report.alerts.push(Alert::new(
            &device.name,
            condition,
            Some(record.occurrence_count),
        ));

        if eval.should_remediate {
            if let Some(serial) = serials.lookup(&device.name) {
                record = record.mark_remediated();
                if let Err(e) = store.put(&key, record) {
                    // Not queued: the flag may not have persisted.
                    record_store_failure(report, &key, &e);
                    return;
                }
                if batch.push(serial) {
                    info!(%key, serial, count = record.occurrence_count, "queued soft reset");
                } else {
                    debug!(%key, serial, "serial already queued this cycle");
                }
                report.queued.push(QueuedReset {
                    device: device.name.clone(),
                    condition,
                    serial: serial.to_owned(),
                });
                return;
            }

            if self.policy.strict_serial_required {
                error!(%key, count = record.occurrence_count, "no serial mapping, cannot remediate");
            } else {
                warn!(%key, count = record.occurrence_count, "no serial mapping, skipping remediation");
            }
            report.missing_serial.push(SerialMiss {
                device: device.name.clone(),
                condition,
                occurrence_count: record.occurrence_count,
            });
        }

        if let Err(e) = store.put(&key, record) {
            record_store_failure(report, &key, &e);
        }
    }
}

fn record_store_failure(report: &mut CycleReport, key: &DebounceKey, err: &StoreError) {
    error!(%key, error = %err, "debounce store failure, skipping device for this cycle");
    report.store_failures.push(StoreFailure {
        device: key.device.clone(),
        condition: key.condition,
        message: err.to_string(),
    });
}
