//! Detection engine orchestration
//!
//! One batch at a time: load the risk state, walk the raw events in input
//! order through the rules, append alerts to the durable log, save the
//! state back whole. A failure on one event skips that event only; a
//! storage failure on load/save fails the batch.

use chrono::Utc;
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;

use crate::config::DetectionConfig;
use crate::detection::{BruteForceRule, GeographyRule, RiskState, WorkHoursRule};
use crate::models::{Alert, Outcome};
use crate::normalize::normalize;
use crate::persistence::{PersistenceError, StateStore};
use crate::remediation::RemediationTrigger;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("storage error: {0}")]
    Storage(#[from] PersistenceError),
}

pub struct DetectionEngine {
    brute_force: BruteForceRule,
    geography: GeographyRule,
    work_hours: WorkHoursRule,
    store: Arc<dyn StateStore>,
    remediation: RemediationTrigger,
    /// Serializes batches: the scheduled scan and the manual rescan both
    /// land here, so risk-state load/save never races.
    batch_lock: Mutex<()>,
}

impl DetectionEngine {
    pub fn new(
        config: &DetectionConfig,
        store: Arc<dyn StateStore>,
        remediation: RemediationTrigger,
    ) -> Self {
        DetectionEngine {
            brute_force: BruteForceRule::new(
                config.brute_force_threshold,
                config.brute_force_window_min,
            ),
            geography: GeographyRule::new(),
            work_hours: WorkHoursRule::new(
                config.work_hour_start,
                config.work_hour_end,
                config.work_hours_utc_offset,
            ),
            store,
            remediation,
            batch_lock: Mutex::new(()),
        }
    }

    /// Process one batch of raw log records in input order and return the
    /// alerts generated by this call.
    pub async fn process_logs(&self, raw_events: &[Value]) -> Result<Vec<Alert>, EngineError> {
        let _batch = self.batch_lock.lock().await;

        if raw_events.is_empty() {
            return Ok(Vec::new());
        }

        let mut state = self.store.load_state()?;
        let mut alerts = Vec::new();

        for raw in raw_events {
            match self.process_event(raw, &mut state).await {
                Ok(emitted) => alerts.extend(emitted),
                Err(e) => log::error!("Error processing a log entry: {}", e),
            }
        }

        state.last_checkpoint = Some(Utc::now());
        self.store.save_state(&state)?;

        Ok(alerts)
    }

    /// Run one normalized event through the rule set for its outcome and
    /// append whatever fires to the durable alert log.
    async fn process_event(
        &self,
        raw: &Value,
        state: &mut RiskState,
    ) -> Result<Vec<Alert>, EngineError> {
        let now = Utc::now();
        let event = normalize(raw, now);
        let mut alerts = Vec::new();

        match event.outcome {
            Outcome::Failure => {
                if let Some(alert) = self.brute_force.on_failure(state, &event, now) {
                    self.store.append_alert(&alert)?;
                    alerts.push(alert);
                }
            }
            Outcome::Success => {
                // Compromise check runs first: it may clear state and
                // trigger remediation before the other rules see the event.
                if let Some(mut alert) = self.brute_force.on_success(state, &event, now) {
                    self.remediation.apply(&mut alert).await;
                    self.store.append_alert(&alert)?;
                    alerts.push(alert);
                }
                if let Some(alert) = self.geography.check(state, &event, now) {
                    self.store.append_alert(&alert)?;
                    alerts.push(alert);
                }
                if let Some(alert) = self.work_hours.check(&event) {
                    self.store.append_alert(&alert)?;
                    alerts.push(alert);
                }
            }
            Outcome::Unknown => {}
        }

        Ok(alerts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ActionTaken, RiskType};
    use crate::persistence::SqliteStateStore;
    use crate::remediation::{RemediationError, Remediator};
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex as StdMutex;

    struct FakeRemediator {
        calls: StdMutex<Vec<String>>,
        fail: bool,
    }

    impl FakeRemediator {
        fn new(fail: bool) -> Arc<Self> {
            Arc::new(FakeRemediator {
                calls: StdMutex::new(Vec::new()),
                fail,
            })
        }
    }

    #[async_trait]
    impl Remediator for FakeRemediator {
        async fn suspend(&self, account_id: &str) -> Result<(), RemediationError> {
            self.calls.lock().unwrap().push(account_id.to_string());
            if self.fail {
                Err(RemediationError::Rejected(503))
            } else {
                Ok(())
            }
        }
    }

    fn engine_with(
        suspend_on_high_risk: bool,
        remediator: Arc<FakeRemediator>,
    ) -> (DetectionEngine, Arc<SqliteStateStore>) {
        let store = Arc::new(SqliteStateStore::in_memory().unwrap());
        let engine = DetectionEngine::new(
            &DetectionConfig::default(),
            store.clone(),
            RemediationTrigger::new(suspend_on_high_risk, remediator),
        );
        (engine, store)
    }

    fn raw_event(username: &str, account_id: &str, result: &str, country: Option<&str>) -> Value {
        let mut event = json!({
            "published": Utc::now().to_rfc3339(),
            "actor": { "alternateId": username, "id": account_id },
            "client": { "ip": "1.1.1.1" },
            "outcome": { "result": result }
        });
        if let Some(country) = country {
            event["client"]["geographicalContext"] = json!({ "country": country });
        }
        event
    }

    fn of_type(alerts: &[Alert], risk_type: RiskType) -> Vec<Alert> {
        alerts
            .iter()
            .filter(|a| a.risk_type == risk_type)
            .cloned()
            .collect()
    }

    #[tokio::test]
    async fn test_empty_batch_is_noop() {
        let (engine, store) = engine_with(true, FakeRemediator::new(false));
        let alerts = engine.process_logs(&[]).await.unwrap();
        assert!(alerts.is_empty());
        // No state mutation, checkpoint untouched
        assert!(store.load_state().unwrap().last_checkpoint.is_none());
    }

    #[tokio::test]
    async fn test_checkpoint_advances_after_batch() {
        let (engine, store) = engine_with(true, FakeRemediator::new(false));
        engine
            .process_logs(&[raw_event("alice", "u1", "FAILURE", None)])
            .await
            .unwrap();
        assert!(store.load_state().unwrap().last_checkpoint.is_some());
    }

    #[tokio::test]
    async fn test_brute_force_end_to_end() {
        let (engine, store) = engine_with(true, FakeRemediator::new(false));

        // Four failures: quiet
        let batch: Vec<Value> = (0..4)
            .map(|_| raw_event("alice", "u1", "FAILURE", None))
            .collect();
        let alerts = engine.process_logs(&batch).await.unwrap();
        assert!(of_type(&alerts, RiskType::BruteForceSuspected).is_empty());

        // Fifth failure fires
        let alerts = engine
            .process_logs(&[raw_event("alice", "u1", "FAILURE", None)])
            .await
            .unwrap();
        assert_eq!(of_type(&alerts, RiskType::BruteForceSuspected).len(), 1);

        // Sixth failure then a success: compromise fires and history clears
        let alerts = engine
            .process_logs(&[
                raw_event("alice", "u1", "FAILURE", None),
                raw_event("alice", "u1", "SUCCESS", None),
            ])
            .await
            .unwrap();
        let compromises = of_type(&alerts, RiskType::BruteForceAccountCompromise);
        assert_eq!(compromises.len(), 1);
        assert_eq!(compromises[0].action_taken, Some(ActionTaken::Suspended));
        assert_eq!(store.load_state().unwrap().failed_attempt_count("alice"), 0);
    }

    #[tokio::test]
    async fn test_remediation_failure_keeps_alert_and_clears_history() {
        let (engine, store) = engine_with(true, FakeRemediator::new(true));

        let mut batch: Vec<Value> = (0..5)
            .map(|_| raw_event("alice", "u1", "FAILURE", None))
            .collect();
        batch.push(raw_event("alice", "u1", "SUCCESS", None));

        let alerts = engine.process_logs(&batch).await.unwrap();
        let compromises = of_type(&alerts, RiskType::BruteForceAccountCompromise);
        assert_eq!(compromises.len(), 1);
        assert_eq!(compromises[0].action_taken, Some(ActionTaken::SuspendFailed));
        assert_eq!(store.load_state().unwrap().failed_attempt_count("alice"), 0);
    }

    #[tokio::test]
    async fn test_remediation_gated_by_config() {
        let remediator = FakeRemediator::new(false);
        let (engine, _store) = engine_with(false, remediator.clone());

        let mut batch: Vec<Value> = (0..5)
            .map(|_| raw_event("alice", "u1", "FAILURE", None))
            .collect();
        batch.push(raw_event("alice", "u1", "SUCCESS", None));

        let alerts = engine.process_logs(&batch).await.unwrap();
        let compromises = of_type(&alerts, RiskType::BruteForceAccountCompromise);
        assert_eq!(compromises.len(), 1);
        assert!(compromises[0].action_taken.is_none());
        assert!(remediator.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unusual_geography_end_to_end() {
        let (engine, _store) = engine_with(true, FakeRemediator::new(false));

        let alerts = engine
            .process_logs(&[raw_event("alice", "u1", "SUCCESS", Some("US"))])
            .await
            .unwrap();
        assert_eq!(of_type(&alerts, RiskType::UnusualGeography).len(), 1);

        // Same country again: suppressed. New country: fires.
        let alerts = engine
            .process_logs(&[
                raw_event("alice", "u1", "SUCCESS", Some("US")),
                raw_event("alice", "u1", "SUCCESS", Some("FR")),
            ])
            .await
            .unwrap();
        let geo = of_type(&alerts, RiskType::UnusualGeography);
        assert_eq!(geo.len(), 1);
        assert!(geo[0].description.contains("FR"));
    }

    #[tokio::test]
    async fn test_unknown_outcome_triggers_no_rules() {
        let (engine, store) = engine_with(true, FakeRemediator::new(false));
        let alerts = engine
            .process_logs(&[raw_event("alice", "u1", "SKIPPED", Some("US"))])
            .await
            .unwrap();
        assert!(alerts.is_empty());
        let state = store.load_state().unwrap();
        assert!(state.known_countries.is_empty());
        assert!(state.failed_attempts.is_empty());
    }

    #[tokio::test]
    async fn test_alerts_also_land_in_durable_log() {
        let (engine, store) = engine_with(true, FakeRemediator::new(false));
        engine
            .process_logs(&[raw_event("alice", "u1", "SUCCESS", Some("US"))])
            .await
            .unwrap();

        let logged = store.list_alerts(10).unwrap();
        assert!(logged
            .iter()
            .any(|a| a.risk_type == RiskType::UnusualGeography));
    }

    #[tokio::test]
    async fn test_same_batch_reproduces_same_alerts_from_same_state() {
        // Pure function of state + input (modulo wall-clock pruning):
        // two engines over identical fresh stores agree.
        let batch: Vec<Value> = (0..5)
            .map(|_| raw_event("alice", "u1", "FAILURE", None))
            .chain(std::iter::once(raw_event("alice", "u1", "SUCCESS", Some("US"))))
            .collect();

        let (engine_a, _) = engine_with(false, FakeRemediator::new(false));
        let (engine_b, _) = engine_with(false, FakeRemediator::new(false));

        let a = engine_a.process_logs(&batch).await.unwrap();
        let b = engine_b.process_logs(&batch).await.unwrap();

        let signature = |alerts: &[Alert]| {
            alerts
                .iter()
                .map(|a| (a.risk_type, a.username.clone(), a.severity))
                .collect::<Vec<_>>()
        };
        assert_eq!(signature(&a), signature(&b));
    }

    #[tokio::test]
    async fn test_work_hours_rule_runs_on_success() {
        // Pin the rule to UTC and use fixed timestamps either side of the
        // working window.
        let store = Arc::new(SqliteStateStore::in_memory().unwrap());
        let config = DetectionConfig {
            work_hours_utc_offset: Some(0),
            ..DetectionConfig::default()
        };
        let engine = DetectionEngine::new(
            &config,
            store,
            RemediationTrigger::new(false, FakeRemediator::new(false)),
        );

        let at = |hour: u32| {
            json!({
                "published": format!("2024-03-04T{:02}:30:00.000Z", hour),
                "actor": { "alternateId": "alice", "id": "u1" },
                "outcome": { "result": "SUCCESS" }
            })
        };

        let alerts = engine.process_logs(&[at(3)]).await.unwrap();
        assert_eq!(of_type(&alerts, RiskType::OutsideBusinessHours).len(), 1);

        let alerts = engine.process_logs(&[at(10)]).await.unwrap();
        assert!(of_type(&alerts, RiskType::OutsideBusinessHours).is_empty());
    }
}
