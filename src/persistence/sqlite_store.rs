//! SQLite implementation of the StateStore trait

use super::{PersistenceError, StateStore};
use crate::detection::RiskState;
use crate::models::{ActionTaken, Alert, RiskType, Severity};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Row};
use std::path::Path;
use std::sync::Mutex;
use uuid::Uuid;

/// SQLite-based state storage
///
/// The risk state lives in a single-row table as one JSON document, read
/// and written whole. Alerts are append-only rows.
pub struct SqliteStateStore {
    conn: Mutex<Connection>,
}

impl SqliteStateStore {
    /// Create a new SQLite state store at the specified path
    ///
    /// Creates the database file and initializes the schema if it doesn't exist.
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self, PersistenceError> {
        let conn = Connection::open(db_path)?;
        let store = SqliteStateStore {
            conn: Mutex::new(conn),
        };
        store.initialize_schema()?;
        Ok(store)
    }

    /// Create an in-memory SQLite database (useful for testing)
    pub fn in_memory() -> Result<Self, PersistenceError> {
        let conn = Connection::open_in_memory()?;
        let store = SqliteStateStore {
            conn: Mutex::new(conn),
        };
        store.initialize_schema()?;
        Ok(store)
    }

    fn initialize_schema(&self) -> Result<(), PersistenceError> {
        let conn = self.conn.lock().unwrap();
        conn.execute_batch(include_str!("schema.sql"))?;
        Ok(())
    }

    fn row_to_alert(row: &Row) -> Result<Alert, rusqlite::Error> {
        let id: String = row.get(0)?;
        let account_id: Option<String> = row.get(1)?;
        let username: Option<String> = row.get(2)?;
        let risk_type: String = row.get(3)?;
        let description: String = row.get(4)?;
        let timestamp: String = row.get(5)?;
        let severity: String = row.get(6)?;
        let action_taken: Option<String> = row.get(7)?;
        Ok(Alert {
            id: Uuid::parse_str(&id).map_err(|e| Self::bad_column(0, e.to_string()))?,
            account_id,
            username,
            risk_type: RiskType::from_str(&risk_type)
                .ok_or_else(|| Self::bad_column(3, format!("invalid risk type: {}", risk_type)))?,
            description,
            timestamp: DateTime::parse_from_rfc3339(&timestamp)
                .map(|dt| dt.with_timezone(&Utc))
                .map_err(|e| Self::bad_column(5, e.to_string()))?,
            severity: Severity::from_str(&severity)
                .ok_or_else(|| Self::bad_column(6, format!("invalid severity: {}", severity)))?,
            action_taken: action_taken.as_deref().and_then(ActionTaken::from_str),
        })
    }

    fn bad_column(index: usize, message: String) -> rusqlite::Error {
        rusqlite::Error::FromSqlConversionFailure(
            index,
            rusqlite::types::Type::Text,
            message.into(),
        )
    }
}

impl StateStore for SqliteStateStore {
    fn load_state(&self) -> Result<RiskState, PersistenceError> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare("SELECT document FROM risk_state WHERE id = 1")?;

        let result = stmt.query_row([], |row| row.get::<_, String>(0));
        match result {
            Ok(document) => serde_json::from_str(&document)
                .map_err(|e| PersistenceError::InvalidData(format!("risk state: {}", e))),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(RiskState::default()),
            Err(e) => Err(e.into()),
        }
    }

    fn save_state(&self, state: &RiskState) -> Result<(), PersistenceError> {
        let document = serde_json::to_string(state)
            .map_err(|e| PersistenceError::InvalidData(format!("risk state: {}", e)))?;
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT OR REPLACE INTO risk_state (id, document) VALUES (1, ?)",
            params![document],
        )?;
        Ok(())
    }

    fn append_alert(&self, alert: &Alert) -> Result<(), PersistenceError> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO alerts
             (id, account_id, username, risk_type, description, timestamp, severity, action_taken)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
            params![
                alert.id.to_string(),
                alert.account_id,
                alert.username,
                alert.risk_type.as_str(),
                alert.description,
                alert.timestamp.to_rfc3339(),
                alert.severity.as_str(),
                alert.action_taken.map(|a| a.as_str()),
            ],
        )?;
        Ok(())
    }

    fn list_alerts(&self, limit: usize) -> Result<Vec<Alert>, PersistenceError> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT id, account_id, username, risk_type, description, timestamp, severity, action_taken
             FROM alerts
             ORDER BY created_at DESC, rowid DESC
             LIMIT ?",
        )?;

        let alerts = stmt
            .query_map(params![limit], |row| Self::row_to_alert(row))?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(alerts)
    }

    fn mark_account_remediated(&self, account_id: &str) -> Result<usize, PersistenceError> {
        let conn = self.conn.lock().unwrap();
        let updated = conn.execute(
            "UPDATE alerts SET action_taken = ? WHERE account_id = ?",
            params![ActionTaken::SuspendedManual.as_str(), account_id],
        )?;
        Ok(updated)
    }

    fn clear_all(&self) -> Result<(), PersistenceError> {
        let conn = self.conn.lock().unwrap();
        conn.execute_batch(
            "DELETE FROM risk_state;
             DELETE FROM alerts;",
        )?;
        Ok(())
    }
}
