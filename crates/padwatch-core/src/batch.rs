// ── Remediation batcher ──
//
// Collects serials across every evaluator in a cycle and submits them in
// one gateway call. Submission is optimistic: once a serial is queued its
// `remediated` marker stays set whatever the gateway says. A failed
// batch is not retried on the next cycle.

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::error::CoreError;
use crate::source::{RemediationGateway, ResetSummary, TokenProvider};

/// Ordered, deduplicated set of serials queued this cycle.
#[derive(Debug, Clone, Default)]
pub struct RemediationBatch {
    serials: IndexSet<String>,
}

impl RemediationBatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `serial`. Returns `false` if it was already queued this cycle.
    pub fn push(&mut self, serial: impl Into<String>) -> bool {
        self.serials.insert(serial.into())
    }

    pub fn contains(&self, serial: &str) -> bool {
        self.serials.contains(serial)
    }

    pub fn len(&self) -> usize {
        self.serials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.serials.is_empty()
    }

    /// Serials in first-queued order.
    pub fn serials(&self) -> Vec<String> {
        self.serials.iter().cloned().collect()
    }

    /// Obtain a token and issue the batched reset.
    ///
    /// An empty batch returns [`RemediationOutcome::Skipped`] without
    /// touching either collaborator. With `max_attempts > 1`, transient
    /// gateway failures are retried within the cycle; everything else is
    /// reported once and left for the next cycle's state to decide.
    pub async fn submit<A, G>(&self, auth: &A, gateway: &G, max_attempts: u32) -> RemediationOutcome
    where
        A: TokenProvider + Sync,
        G: RemediationGateway + Sync,
    {
        if self.is_empty() {
            return RemediationOutcome::Skipped;
        }

        let token = match auth.access_token().await {
            Ok(token) => token,
            Err(e) => {
                error!(error = %e, queued = self.len(), "could not obtain gateway token");
                return RemediationOutcome::Failed {
                    stage: RemediationStage::Auth,
                    message: e.to_string(),
                    attempts: 0,
                };
            }
        };

        let serials = self.serials();
        let max_attempts = max_attempts.max(1);
        let mut attempt = 0;

        loop {
            attempt += 1;
            match gateway.submit_reset(&token, &serials).await {
                Ok(summary) => {
                    if summary.failed > 0 {
                        warn!(
                            total = summary.total,
                            accepted = summary.accepted,
                            failed = summary.failed,
                            "gateway rejected some resets"
                        );
                    } else {
                        info!(
                            total = summary.total,
                            accepted = summary.accepted,
                            "soft resets accepted"
                        );
                    }
                    return RemediationOutcome::Submitted {
                        summary,
                        attempts: attempt,
                    };
                }
                Err(e) if e.is_transient() && attempt < max_attempts => {
                    warn!(error = %e, attempt, max_attempts, "gateway call failed, retrying");
                }
                Err(e) => {
                    error!(error = %e, attempt, queued = serials.len(), "gateway call failed");
                    if matches!(e, CoreError::AuthenticationFailed { .. }) {
                        auth.invalidate();
                    }
                    return RemediationOutcome::Failed {
                        stage: RemediationStage::Gateway,
                        message: e.to_string(),
                        attempts: attempt,
                    };
                }
            }
        }
    }
}

/// Which step of submission failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RemediationStage {
    Auth,
    Gateway,
}

/// What happened to the cycle's batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "kebab-case")]
pub enum RemediationOutcome {
    /// Nothing queued; no token or gateway call made.
    Skipped,
    /// Batch built but deliberately not sent.
    DryRun { would_reset: usize },
    Submitted {
        #[serde(flatten)]
        summary: ResetSummary,
        attempts: u32,
    },
    Failed {
        stage: RemediationStage,
        message: String,
        attempts: u32,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicates_are_dropped_in_order() {
        let mut batch = RemediationBatch::new();
        assert!(batch.push("SN-B"));
        assert!(batch.push("SN-A"));
        assert!(!batch.push("SN-B"));
        assert_eq!(batch.serials(), vec!["SN-B".to_owned(), "SN-A".to_owned()]);
        assert_eq!(batch.len(), 2);
    }

    #[test]
    fn outcome_serializes_with_tag() {
        let outcome = RemediationOutcome::Submitted {
            summary: ResetSummary {
                total: 2,
                accepted: 1,
                failed: 1,
            },
            attempts: 1,
        };
        let value = serde_json::to_value(&outcome).ok();
        assert_eq!(
            value,
            Some(serde_json::json!({
                "result": "submitted",
                "total": 2,
                "accepted": 1,
                "failed": 1,
                "attempts": 1
            }))
        );
    }
}
