use chrono::{DateTime, Utc};

/// Canonical view of one raw identity-provider log record.
///
/// Produced by the normalizer; missing fields resolve to `None` and an
/// unrecognized outcome resolves to [`Outcome::Unknown`] rather than failing.
#[derive(Debug, Clone)]
pub struct LogEvent {
    /// Event time. `None` only when the record carried an unparseable
    /// timestamp; an absent timestamp defaults to processing time.
    pub timestamp: Option<DateTime<Utc>>,
    pub account_id: Option<String>,
    pub username: Option<String>,
    pub source_ip: Option<String>,
    pub country: Option<String>,
    pub outcome: Outcome,
}

/// Outcome of the logged operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    Failure,
    Unknown,
}

impl Outcome {
    /// Parse the provider's `outcome.result` field, case-insensitively.
    pub fn from_result(result: Option<&str>) -> Self {
        match result.map(str::to_lowercase).as_deref() {
            Some("success") => Outcome::Success,
            Some("failure") => Outcome::Failure,
            _ => Outcome::Unknown,
        }
    }
}
