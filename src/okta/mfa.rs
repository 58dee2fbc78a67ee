//! MFA factor audit
//!
//! Walks the org's users and flags accounts whose factor enrollment is
//! weak: no factors at all, or nothing stronger than SMS.

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

use super::{OktaClient, OktaError};

#[derive(Debug, Clone, Deserialize)]
pub struct OktaUser {
    pub id: String,
    #[serde(default)]
    pub profile: OktaUserProfile,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OktaUserProfile {
    #[serde(default)]
    pub login: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OktaFactor {
    #[serde(rename = "factorType", default)]
    pub factor_type: Option<String>,
    #[serde(default)]
    pub provider: Option<String>,
}

/// One user flagged by the audit.
#[derive(Debug, Clone, Serialize)]
pub struct MfaFinding {
    pub user_id: String,
    pub login: Option<String>,
    pub factor_count: usize,
    pub reason: String,
}

/// A factor set is weak when it is empty or every factor is SMS-based.
pub fn has_weak_factors(factors: &[OktaFactor]) -> bool {
    if factors.is_empty() {
        return true;
    }
    factors.iter().all(|f| {
        let factor_type = f.factor_type.as_deref().unwrap_or("");
        let provider = f.provider.as_deref().unwrap_or("");
        factor_type.to_lowercase().contains("sms") || provider.to_lowercase().contains("sms")
    })
}

impl OktaClient {
    /// List users (single page, provider max page size).
    pub async fn list_users(&self) -> Result<Vec<OktaUser>, OktaError> {
        let endpoint = self.endpoint("/users");
        let response = self
            .http()
            .get(&endpoint)
            .query(&[("limit", "200")])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(OktaError::Api {
                status: response.status(),
                endpoint,
            });
        }
        Ok(response.json().await?)
    }

    /// Enrolled factors for one user. 404 means no factors, not an error.
    pub async fn user_factors(&self, user_id: &str) -> Result<Vec<OktaFactor>, OktaError> {
        let endpoint = self.endpoint(&format!("/users/{}/factors", user_id));
        let response = self.http().get(&endpoint).send().await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(Vec::new());
        }
        if !response.status().is_success() {
            return Err(OktaError::Api {
                status: response.status(),
                endpoint,
            });
        }
        Ok(response.json().await?)
    }

    /// Audit every user's factor enrollment and return the weak ones.
    pub async fn audit_mfa(&self) -> Result<Vec<MfaFinding>, OktaError> {
        let users = self.list_users().await?;
        log::info!("Auditing MFA factors for {} users", users.len());

        let mut findings = Vec::new();
        for user in users {
            let factors = match self.user_factors(&user.id).await {
                Ok(factors) => factors,
                Err(e) => {
                    log::error!("Error fetching factors for {}: {}", user.id, e);
                    continue;
                }
            };

            if has_weak_factors(&factors) {
                let reason = if factors.is_empty() {
                    "no MFA factors enrolled".to_string()
                } else {
                    "only SMS factors enrolled".to_string()
                };
                findings.push(MfaFinding {
                    user_id: user.id,
                    login: user.profile.login,
                    factor_count: factors.len(),
                    reason,
                });
            }
        }
        Ok(findings)
    }
}
