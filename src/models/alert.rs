use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Behavioral risk category of an alert
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskType {
    BruteForceSuspected,
    BruteForceAccountCompromise,
    UnusualGeography,
    OutsideBusinessHours,
}

impl RiskType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskType::BruteForceSuspected => "brute_force_suspected",
            RiskType::BruteForceAccountCompromise => "brute_force_account_compromise",
            RiskType::UnusualGeography => "unusual_geography",
            RiskType::OutsideBusinessHours => "outside_business_hours",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "brute_force_suspected" => Some(RiskType::BruteForceSuspected),
            "brute_force_account_compromise" => Some(RiskType::BruteForceAccountCompromise),
            "unusual_geography" => Some(RiskType::UnusualGeography),
            "outside_business_hours" => Some(RiskType::OutsideBusinessHours),
            _ => None,
        }
    }
}

/// Coarse triage ordering: medium < high < critical. Display only, never
/// used for control flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Medium,
    High,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "medium" => Some(Severity::Medium),
            "high" => Some(Severity::High),
            "critical" => Some(Severity::Critical),
            _ => None,
        }
    }
}

/// Remediation outcome recorded on an alert after the fact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionTaken {
    #[serde(rename = "suspended")]
    Suspended,
    #[serde(rename = "suspend-failed")]
    SuspendFailed,
    #[serde(rename = "suspended-manual")]
    SuspendedManual,
}

impl ActionTaken {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionTaken::Suspended => "suspended",
            ActionTaken::SuspendFailed => "suspend-failed",
            ActionTaken::SuspendedManual => "suspended-manual",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "suspended" => Some(ActionTaken::Suspended),
            "suspend-failed" => Some(ActionTaken::SuspendFailed),
            "suspended-manual" => Some(ActionTaken::SuspendedManual),
            _ => None,
        }
    }
}

/// A normalized risk alert.
///
/// Appended to the durable alert log when a rule fires; the only later
/// mutation is setting `action_taken` once remediation runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alert {
    /// Unique id; uniqueness is the only contract, not orderability.
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    pub account_id: Option<String>,
    pub username: Option<String>,
    pub risk_type: RiskType,
    pub description: String,
    /// Event timestamp, not detection time.
    pub timestamp: DateTime<Utc>,
    pub severity: Severity,
    pub action_taken: Option<ActionTaken>,
}

impl Alert {
    pub fn new(
        account_id: Option<String>,
        username: Option<String>,
        risk_type: RiskType,
        description: String,
        severity: Severity,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Alert {
            id: Uuid::new_v4(),
            account_id,
            username,
            risk_type,
            description,
            timestamp,
            severity,
            action_taken: None,
        }
    }
}
