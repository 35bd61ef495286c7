//! Alert delivery for blocked runs.
//!
//! A delivery channel implements [`AlertDispatcher`]. Dispatch never returns
//! an error: every attempt yields a [`DeliveryOutcome`], and
//! [`notify_on_block`] hands all of them back so the caller decides what a
//! failed delivery means for the job.
//!
//! With the `webhook` feature, [`WebhookDispatcher`] posts generic JSON or
//! Slack-style payloads over HTTP.

#[cfg(feature = "webhook")]
mod webhook;

use std::fmt::Write;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::gate::IncoherenceReport;

#[cfg(feature = "webhook")]
pub use webhook::{SecureString, WebhookConfig, WebhookDispatcher, WebhookFormat};

/// Event name carried by generic payloads.
pub const BLOCK_EVENT: &str = "fluxguard_incoherence_block";

/// What gets delivered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertPayload {
    pub title: String,
    /// Plain-text summary, one fact per line.
    pub text: String,
    pub report: IncoherenceReport,
    pub timestamp: DateTime<Utc>,
}

impl AlertPayload {
    pub fn from_report(report: &IncoherenceReport) -> Self {
        let title = format!(
            "FluxGuard {}: incoherence_score={:.6} threshold={:.6}",
            report.decision, report.incoherence_score, report.threshold
        );

        let v = &report.violations;
        let mut text = String::new();
        let _ = writeln!(text, "{title}");
        let _ = writeln!(
            text,
            "violations: v_null={:.6} v_drift={:.6} v_void={:.6}",
            v.v_null, v.v_drift, v.v_void
        );
        let _ = writeln!(text, "weights: {}", report.weights);
        let unmeasured = report.not_measured();
        if !unmeasured.is_empty() {
            let _ = writeln!(text, "not measured: {}", unmeasured.join(", "));
        }

        Self {
            title,
            text,
            report: report.clone(),
            timestamp: report.generated_at_utc,
        }
    }
}

/// Result of one delivery attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DeliveryStatus {
    Delivered,
    Failed { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryOutcome {
    pub channel: String,
    #[serde(flatten)]
    pub status: DeliveryStatus,
}

impl DeliveryOutcome {
    pub fn delivered(channel: impl Into<String>) -> Self {
        Self {
            channel: channel.into(),
            status: DeliveryStatus::Delivered,
        }
    }

    pub fn failed(channel: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            channel: channel.into(),
            status: DeliveryStatus::Failed {
                reason: reason.into(),
            },
        }
    }

    pub fn is_delivered(&self) -> bool {
        matches!(self.status, DeliveryStatus::Delivered)
    }
}

/// A delivery channel.
#[async_trait]
pub trait AlertDispatcher: Send + Sync {
    /// Channel name recorded in outcomes.
    fn name(&self) -> &str;

    async fn dispatch(&self, payload: &AlertPayload) -> DeliveryOutcome;
}

/// Sends `report` to every dispatcher when it is a BLOCK, in order.
///
/// Returns an empty vector for an OK report.
pub async fn notify_on_block(
    dispatchers: &[Box<dyn AlertDispatcher>],
    report: &IncoherenceReport,
) -> Vec<DeliveryOutcome> {
    if !report.is_block() {
        return Vec::new();
    }

    let payload = AlertPayload::from_report(report);
    let mut outcomes = Vec::with_capacity(dispatchers.len());
    for dispatcher in dispatchers {
        let outcome = dispatcher.dispatch(&payload).await;
        match &outcome.status {
            DeliveryStatus::Delivered => {
                info!(channel = %outcome.channel, "Alert delivered");
            }
            DeliveryStatus::Failed { reason } => {
                warn!(channel = %outcome.channel, reason = %reason, "Alert delivery failed");
            }
        }
        outcomes.push(outcome);
    }
    outcomes
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::gate::{GateConfig, GateInputs, IncoherenceGate};
    use crate::sources::{ResolvedSummary, SoakSummary};

    struct RecordingDispatcher {
        name: String,
        fail: bool,
        seen: Arc<Mutex<Vec<String>>>,
    }

    #[async_trait]
    impl AlertDispatcher for RecordingDispatcher {
        fn name(&self) -> &str {
            &self.name
        }

        async fn dispatch(&self, payload: &AlertPayload) -> DeliveryOutcome {
            self.seen.lock().unwrap().push(payload.title.clone());
            if self.fail {
                DeliveryOutcome::failed(&self.name, "connection refused")
            } else {
                DeliveryOutcome::delivered(&self.name)
            }
        }
    }

    fn report(failed_runs: u64) -> IncoherenceReport {
        let gate = IncoherenceGate::new(GateConfig::default()).unwrap();
        gate.evaluate(&GateInputs::new().with_soak(ResolvedSummary {
            label: "nulltrace".into(),
            path: "nulltrace_summary.json".into(),
            summary: SoakSummary {
                runs: 10,
                failed_runs,
                min_score: None,
            },
        }))
    }

    fn dispatchers(seen: &Arc<Mutex<Vec<String>>>) -> Vec<Box<dyn AlertDispatcher>> {
        vec![
            Box::new(RecordingDispatcher {
                name: "ok".into(),
                fail: false,
                seen: Arc::clone(seen),
            }),
            Box::new(RecordingDispatcher {
                name: "broken".into(),
                fail: true,
                seen: Arc::clone(seen),
            }),
        ]
    }

    #[test]
    fn test_payload_from_report() {
        let payload = AlertPayload::from_report(&report(10));
        assert_eq!(
            payload.title,
            "FluxGuard BLOCK: incoherence_score=0.300000 threshold=0.250000"
        );
        assert!(payload.text.contains("v_null=1.000000"));
        assert!(payload.text.contains("not measured: voidmark, drift"));
        assert_eq!(payload.timestamp, payload.report.generated_at_utc);
    }

    #[tokio::test]
    async fn test_block_dispatches_to_all() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let outcomes = notify_on_block(&dispatchers(&seen), &report(10)).await;

        assert_eq!(outcomes.len(), 2);
        assert!(outcomes[0].is_delivered());
        assert_eq!(
            outcomes[1].status,
            DeliveryStatus::Failed {
                reason: "connection refused".into()
            }
        );
        assert_eq!(seen.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_ok_dispatches_nothing() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let outcomes = notify_on_block(&dispatchers(&seen), &report(1)).await;
        assert!(outcomes.is_empty());
        assert!(seen.lock().unwrap().is_empty());
    }

    #[test]
    fn test_outcome_serialization() {
        let json = serde_json::to_value(DeliveryOutcome::failed("slack", "timeout")).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"channel": "slack", "status": "failed", "reason": "timeout"})
        );
    }
}
