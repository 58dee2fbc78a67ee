//! Durable detection state
//!
//! One [`RiskState`] value is loaded at the start of a batch, mutated by the
//! rules while the batch runs, and written back whole when the batch ends.
//! The detection engine is the only writer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Most recent distinct countries remembered per account.
pub const KNOWN_COUNTRY_CAP: usize = 10;

/// One failed authentication attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailedAttempt {
    pub timestamp: DateTime<Utc>,
    pub source_ip: Option<String>,
}

/// Cross-batch detection state, persisted whole after every batch.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RiskState {
    /// Timestamp boundary of already-processed log events.
    #[serde(default)]
    pub last_checkpoint: Option<DateTime<Utc>>,
    /// Failed-attempt history per username, insertion order = arrival order.
    #[serde(default)]
    pub failed_attempts: HashMap<String, Vec<FailedAttempt>>,
    /// Countries already seen per account id.
    #[serde(default)]
    pub known_countries: HashMap<String, Vec<String>>,
}

impl RiskState {
    /// Append a failed attempt to a username's history.
    pub fn record_failed_attempt(
        &mut self,
        username: &str,
        timestamp: DateTime<Utc>,
        source_ip: Option<String>,
    ) {
        self.failed_attempts
            .entry(username.to_string())
            .or_default()
            .push(FailedAttempt {
                timestamp,
                source_ip,
            });
    }

    /// Drop attempts older than `cutoff` (records at exactly `cutoff` are
    /// kept) and return the remaining count.
    pub fn prune_failed_attempts(&mut self, username: &str, cutoff: DateTime<Utc>) -> usize {
        match self.failed_attempts.get_mut(username) {
            Some(attempts) => {
                attempts.retain(|a| a.timestamp >= cutoff);
                attempts.len()
            }
            None => 0,
        }
    }

    /// Current (unpruned) history length for a username.
    pub fn failed_attempt_count(&self, username: &str) -> usize {
        self.failed_attempts
            .get(username)
            .map(Vec::len)
            .unwrap_or(0)
    }

    pub fn clear_failed_attempts(&mut self, username: &str) {
        if let Some(attempts) = self.failed_attempts.get_mut(username) {
            attempts.clear();
        }
    }

    pub fn is_known_country(&self, account_id: &str, country: &str) -> bool {
        self.known_countries
            .get(account_id)
            .map(|known| known.iter().any(|c| c == country))
            .unwrap_or(false)
    }

    /// Remember a country for an account, evicting the oldest entries beyond
    /// the cap. Callers check [`is_known_country`](Self::is_known_country)
    /// first, so the set never holds duplicates.
    pub fn record_country(&mut self, account_id: &str, country: &str) {
        let known = self.known_countries.entry(account_id.to_string()).or_default();
        known.push(country.to_string());
        if known.len() > KNOWN_COUNTRY_CAP {
            let excess = known.len() - KNOWN_COUNTRY_CAP;
            known.drain(..excess);
        }
    }
}
