//! Outside-business-hours detection
//!
//! The hour of day is taken in a configured fixed UTC offset when one is
//! set, otherwise in the process-local time zone. An unparseable event
//! timestamp skips this rule only, never the rest of the batch.

use chrono::{DateTime, FixedOffset, Local, Timelike, Utc};

use crate::models::{Alert, LogEvent, RiskType, Severity};

pub struct WorkHoursRule {
    start_hour: u32,
    end_hour: u32,
    offset: Option<FixedOffset>,
}

impl WorkHoursRule {
    pub fn new(start_hour: u32, end_hour: u32, utc_offset_hours: Option<i32>) -> Self {
        WorkHoursRule {
            start_hour,
            end_hour,
            offset: utc_offset_hours.and_then(|h| FixedOffset::east_opt(h * 3600)),
        }
    }

    fn local_hour(&self, ts: DateTime<Utc>) -> u32 {
        match self.offset {
            Some(offset) => ts.with_timezone(&offset).hour(),
            None => ts.with_timezone(&Local).hour(),
        }
    }

    /// Evaluate a SUCCESS event. Fires iff the local hour is before the
    /// working window or at/after its end.
    pub fn check(&self, event: &LogEvent) -> Option<Alert> {
        let ts = event.timestamp?;
        let hour = self.local_hour(ts);

        if hour >= self.start_hour && hour < self.end_hour {
            return None;
        }

        Some(Alert::new(
            event.account_id.clone(),
            event.username.clone(),
            RiskType::OutsideBusinessHours,
            format!(
                "Login at {}:00 which is outside working hours ({}-{})",
                hour, self.start_hour, self.end_hour
            ),
            Severity::Medium,
            ts,
        ))
    }
}
