//! Unusual geography detection
//!
//! Flags successful logins from a country the account has never been seen
//! in, then remembers the country (bounded, oldest evicted first).

use chrono::{DateTime, Utc};

use crate::detection::state::RiskState;
use crate::models::{Alert, LogEvent, RiskType, Severity};

pub struct GeographyRule;

impl GeographyRule {
    pub fn new() -> Self {
        GeographyRule
    }

    /// Evaluate a SUCCESS event. Needs both an account id and a resolved
    /// country; anything else is silently not applicable.
    pub fn check(
        &self,
        state: &mut RiskState,
        event: &LogEvent,
        now: DateTime<Utc>,
    ) -> Option<Alert> {
        let account_id = event.account_id.as_deref()?;
        let country = event.country.as_deref()?;

        if state.is_known_country(account_id, country) {
            return None;
        }
        state.record_country(account_id, country);

        Some(Alert::new(
            event.account_id.clone(),
            event.username.clone(),
            RiskType::UnusualGeography,
            format!("Login from new country: {}", country),
            Severity::High,
            event.timestamp.unwrap_or(now),
        ))
    }
}

impl Default for GeographyRule {
    fn default() -> Self {
        Self::new()
    }
}
