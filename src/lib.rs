pub mod api;
pub mod config;
pub mod detection;
pub mod models;
pub mod normalize;
pub mod okta;
pub mod persistence;
pub mod remediation;
pub mod worker;

// Re-export commonly used types
pub use config::Config;
pub use detection::{DetectionEngine, RiskState};
pub use models::{Alert, LogEvent, Outcome, RiskType, Severity};
pub use okta::OktaClient;
pub use persistence::{SqliteStateStore, StateStore};
pub use remediation::{RemediationTrigger, Remediator};
pub use worker::{LogSource, Scanner};
