//! User lifecycle operations

use async_trait::async_trait;

use super::{OktaClient, OktaError};
use crate::remediation::{RemediationError, Remediator};

impl OktaClient {
    /// Suspend a user account.
    pub async fn suspend_user(&self, user_id: &str) -> Result<(), OktaError> {
        let endpoint = self.endpoint(&format!("/users/{}/lifecycle/suspend", user_id));
        let response = self.http().post(&endpoint).send().await?;

        if !response.status().is_success() {
            return Err(OktaError::Api {
                status: response.status(),
                endpoint,
            });
        }
        Ok(())
    }
}

#[async_trait]
impl Remediator for OktaClient {
    async fn suspend(&self, account_id: &str) -> Result<(), RemediationError> {
        match self.suspend_user(account_id).await {
            Ok(()) => Ok(()),
            Err(OktaError::Api { status, .. }) => {
                Err(RemediationError::Rejected(status.as_u16()))
            }
            Err(e) => Err(RemediationError::Request(e.to_string())),
        }
    }
}
