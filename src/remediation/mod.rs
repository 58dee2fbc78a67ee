//! Account remediation
//!
//! A critical brute-force-compromise alert can auto-suspend the affected
//! account. The trigger is config-gated, records the outcome on the alert,
//! and never lets a failed suspend abort detection.

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

use crate::models::{ActionTaken, Alert};

/// Errors from the external suspend operation
#[derive(Error, Debug)]
pub enum RemediationError {
    #[error("suspend request failed: {0}")]
    Request(String),

    #[error("suspend rejected with status {0}")]
    Rejected(u16),
}

/// External account-suspend actuator
#[async_trait]
pub trait Remediator: Send + Sync {
    async fn suspend(&self, account_id: &str) -> Result<(), RemediationError>;
}

/// Config-gated remediation applied to critical alerts.
pub struct RemediationTrigger {
    enabled: bool,
    remediator: Arc<dyn Remediator>,
}

impl RemediationTrigger {
    pub fn new(enabled: bool, remediator: Arc<dyn Remediator>) -> Self {
        RemediationTrigger {
            enabled,
            remediator,
        }
    }

    /// Suspend the alert's account and record the outcome on the alert.
    /// No-op when disabled or when the alert has no account id.
    pub async fn apply(&self, alert: &mut Alert) {
        if !self.enabled {
            return;
        }
        let account_id = match alert.account_id.as_deref() {
            Some(id) => id,
            None => return,
        };

        match self.remediator.suspend(account_id).await {
            Ok(()) => {
                log::info!("Suspended account {}", account_id);
                alert.action_taken = Some(ActionTaken::Suspended);
            }
            Err(e) => {
                log::error!("Remediation failed: {}", e);
                alert.action_taken = Some(ActionTaken::SuspendFailed);
            }
        }
    }
}
