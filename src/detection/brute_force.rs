//! Brute force detection
//!
//! Two coupled checks over the same per-username failed-attempt history:
//! repeated failures inside a sliding window, and a success landing on top
//! of a saturated history (likely account compromise).

use chrono::{DateTime, Duration, Utc};

use crate::detection::state::RiskState;
use crate::models::{Alert, LogEvent, RiskType, Severity};

pub struct BruteForceRule {
    threshold: usize,
    window: Duration,
}

impl BruteForceRule {
    pub fn new(threshold: usize, window_min: i64) -> Self {
        BruteForceRule {
            threshold,
            window: Duration::minutes(window_min),
        }
    }

    /// Evaluate a FAILURE event. Appends to the username's history, prunes
    /// against wall-clock `now`, and fires once the pruned count reaches the
    /// threshold. The history is never reset here, so the alert keeps firing
    /// while the window stays saturated.
    pub fn on_failure(
        &self,
        state: &mut RiskState,
        event: &LogEvent,
        now: DateTime<Utc>,
    ) -> Option<Alert> {
        let username = event.username.as_deref()?;

        if let Some(ts) = event.timestamp {
            state.record_failed_attempt(username, ts, event.source_ip.clone());
        }

        let count = state.prune_failed_attempts(username, now - self.window);
        if count < self.threshold {
            return None;
        }

        Some(Alert::new(
            event.account_id.clone(),
            event.username.clone(),
            RiskType::BruteForceSuspected,
            format!(
                "Detected {} failed attempts within {}m",
                count,
                self.window.num_minutes()
            ),
            Severity::High,
            event.timestamp.unwrap_or(now),
        ))
    }

    /// Evaluate a SUCCESS event against prior failures. Reads the current
    /// history length without re-pruning (carried behavior; stale entries
    /// can still count). Fires critical and clears the history; the clear
    /// happens regardless of what remediation later does with the alert.
    pub fn on_success(
        &self,
        state: &mut RiskState,
        event: &LogEvent,
        now: DateTime<Utc>,
    ) -> Option<Alert> {
        let username = event.username.as_deref()?;

        let count = state.failed_attempt_count(username);
        if count == 0 || count < self.threshold {
            return None;
        }

        state.clear_failed_attempts(username);

        Some(Alert::new(
            event.account_id.clone(),
            event.username.clone(),
            RiskType::BruteForceAccountCompromise,
            format!(
                "Succeeded after {} recent failures, possible credential stuffing or brute force",
                count
            ),
            Severity::Critical,
            event.timestamp.unwrap_or(now),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Outcome;

    fn failure(username: &str, ts: DateTime<Utc>) -> LogEvent {
        LogEvent {
            timestamp: Some(ts),
            account_id: Some("u1".to_string()),
            username: Some(username.to_string()),
            source_ip: Some("1.1.1.1".to_string()),
            country: None,
            outcome: Outcome::Failure,
        }
    }

    fn success(username: &str, ts: DateTime<Utc>) -> LogEvent {
        LogEvent {
            timestamp: Some(ts),
            account_id: Some("u1".to_string()),
            username: Some(username.to_string()),
            source_ip: Some("1.1.1.1".to_string()),
            country: None,
            outcome: Outcome::Success,
        }
    }

    #[test]
    fn test_fires_at_threshold() {
        let rule = BruteForceRule::new(5, 5);
        let mut state = RiskState::default();
        let now = Utc::now();

        for i in 0..4 {
            let alert = rule.on_failure(&mut state, &failure("alice", now), now);
            assert!(alert.is_none(), "attempt {} should not fire", i + 1);
        }

        let alert = rule.on_failure(&mut state, &failure("alice", now), now);
        let alert = alert.expect("fifth failure fires");
        assert_eq!(alert.risk_type, RiskType::BruteForceSuspected);
        assert_eq!(alert.severity, Severity::High);
        assert!(alert.description.contains("5 failed attempts"));
    }

    #[test]
    fn test_fires_monotonically_past_threshold() {
        let rule = BruteForceRule::new(3, 5);
        let mut state = RiskState::default();
        let now = Utc::now();

        for _ in 0..3 {
            rule.on_failure(&mut state, &failure("alice", now), now);
        }
        // Every further failure inside the window fires again
        for _ in 0..3 {
            assert!(rule
                .on_failure(&mut state, &failure("alice", now), now)
                .is_some());
        }
    }

    #[test]
    fn test_old_attempts_pruned() {
        let rule = BruteForceRule::new(3, 5);
        let mut state = RiskState::default();
        let now = Utc::now();
        let stale = now - Duration::minutes(10);

        for _ in 0..4 {
            state.record_failed_attempt("alice", stale, None);
        }

        // Stale history is pruned before the threshold check
        let alert = rule.on_failure(&mut state, &failure("alice", now), now);
        assert!(alert.is_none());
        assert_eq!(state.failed_attempt_count("alice"), 1);
    }

    #[test]
    fn test_unparseable_timestamp_records_nothing() {
        let rule = BruteForceRule::new(3, 5);
        let mut state = RiskState::default();
        let now = Utc::now();

        let mut event = failure("alice", now);
        event.timestamp = None;
        assert!(rule.on_failure(&mut state, &event, now).is_none());
        assert_eq!(state.failed_attempt_count("alice"), 0);
    }

    #[test]
    fn test_failure_without_username_ignored() {
        let rule = BruteForceRule::new(3, 5);
        let mut state = RiskState::default();
        let now = Utc::now();

        let mut event = failure("alice", now);
        event.username = None;
        assert!(rule.on_failure(&mut state, &event, now).is_none());
        assert!(state.failed_attempts.is_empty());
    }

    #[test]
    fn test_success_below_threshold_keeps_history() {
        let rule = BruteForceRule::new(5, 5);
        let mut state = RiskState::default();
        let now = Utc::now();

        for _ in 0..3 {
            rule.on_failure(&mut state, &failure("alice", now), now);
        }

        assert!(rule.on_success(&mut state, &success("alice", now), now).is_none());
        assert_eq!(state.failed_attempt_count("alice"), 3);
    }

    #[test]
    fn test_success_at_threshold_fires_and_clears() {
        let rule = BruteForceRule::new(5, 5);
        let mut state = RiskState::default();
        let now = Utc::now();

        for _ in 0..6 {
            rule.on_failure(&mut state, &failure("alice", now), now);
        }

        let alert = rule
            .on_success(&mut state, &success("alice", now), now)
            .expect("compromise fires");
        assert_eq!(alert.risk_type, RiskType::BruteForceAccountCompromise);
        assert_eq!(alert.severity, Severity::Critical);
        assert!(alert.description.contains("6 recent failures"));
        assert_eq!(state.failed_attempt_count("alice"), 0);

        // A second success has nothing left to flag
        assert!(rule.on_success(&mut state, &success("alice", now), now).is_none());
    }

    #[test]
    fn test_success_counts_unpruned_history() {
        let rule = BruteForceRule::new(5, 5);
        let mut state = RiskState::default();
        let now = Utc::now();
        let stale = now - Duration::minutes(30);

        // Entries far outside the window, never pruned on the success path
        for _ in 0..5 {
            state.record_failed_attempt("alice", stale, None);
        }

        let alert = rule.on_success(&mut state, &success("alice", now), now);
        assert!(alert.is_some());
    }

    #[test]
    fn test_usernames_independent() {
        let rule = BruteForceRule::new(3, 5);
        let mut state = RiskState::default();
        let now = Utc::now();

        for _ in 0..3 {
            rule.on_failure(&mut state, &failure("alice", now), now);
        }
        assert!(rule.on_failure(&mut state, &failure("bob", now), now).is_none());
    }
}
