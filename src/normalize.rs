//! Event normalization
//!
//! Okta system log records are heterogeneous: the same logical field can
//! live under several shapes depending on event type and API version. Each
//! field is resolved through an ordered chain of JSON-pointer lookups, first
//! match wins. Normalization never fails; anything missing comes back as
//! `None` / `Unknown`.

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::models::{LogEvent, Outcome};

const USERNAME_PATHS: &[&str] = &["/actor/alternateId", "/target/0/displayName"];
const ACCOUNT_ID_PATHS: &[&str] = &["/actor/id", "/target/0/id"];
const SOURCE_IP_PATHS: &[&str] = &["/client/ip", "/request/ip"];
const COUNTRY_PATHS: &[&str] = &[
    "/client/geographicalContext/country",
    "/client/geo/country",
    "/geographicalContext/country",
];

/// Resolve the first string value along a chain of JSON pointers.
fn first_string(record: &Value, paths: &[&str]) -> Option<String> {
    paths
        .iter()
        .find_map(|path| record.pointer(path).and_then(Value::as_str))
        .map(str::to_owned)
}

/// Parse the record's `published` timestamp.
///
/// Absent defaults to processing time; present but unparseable yields `None`
/// so timestamp-dependent rules can skip the event.
fn event_time(record: &Value, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    match record.pointer("/published").and_then(Value::as_str) {
        None => Some(now),
        Some(raw) => DateTime::parse_from_rfc3339(raw)
            .ok()
            .map(|dt| dt.with_timezone(&Utc)),
    }
}

/// Extract a canonical [`LogEvent`] from one raw log record.
pub fn normalize(record: &Value, now: DateTime<Utc>) -> LogEvent {
    LogEvent {
        timestamp: event_time(record, now),
        account_id: first_string(record, ACCOUNT_ID_PATHS),
        username: first_string(record, USERNAME_PATHS),
        source_ip: first_string(record, SOURCE_IP_PATHS),
        country: first_string(record, COUNTRY_PATHS),
        outcome: Outcome::from_result(
            record.pointer("/outcome/result").and_then(Value::as_str),
        ),
    }
}
