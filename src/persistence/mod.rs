//! Persistence module for detection state and the alert log
//!
//! The store has whole-document semantics for the risk state (load the
//! whole thing, write the whole thing back, last writer wins) and an
//! append-only log for alerts. It is not responsible for serializing
//! concurrent writers; the detection engine's batch lock does that.

pub mod sqlite_store;

pub use sqlite_store::SqliteStateStore;

use crate::detection::RiskState;
use crate::models::Alert;
use thiserror::Error;

/// Errors that can occur during persistence operations
#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid data in database: {0}")]
    InvalidData(String),
}

/// Trait for state persistence backends
pub trait StateStore: Send + Sync {
    /// Load the risk state. Cold start (nothing stored yet) materializes
    /// the empty defaults.
    fn load_state(&self) -> Result<RiskState, PersistenceError>;

    /// Overwrite the stored risk state with this one.
    fn save_state(&self, state: &RiskState) -> Result<(), PersistenceError>;

    /// Append an alert to the durable alert log.
    fn append_alert(&self, alert: &Alert) -> Result<(), PersistenceError>;

    /// Most recent alerts, newest first.
    fn list_alerts(&self, limit: usize) -> Result<Vec<Alert>, PersistenceError>;

    /// Stamp `suspended-manual` on every alert for an account. Returns the
    /// number of alerts updated.
    fn mark_account_remediated(&self, account_id: &str) -> Result<usize, PersistenceError>;

    /// Clear all data (useful for testing)
    fn clear_all(&self) -> Result<(), PersistenceError>;
}
