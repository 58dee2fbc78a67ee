//! Okta API client
//!
//! Thin adapters over the Okta REST API: the system log endpoint (log
//! source), the user lifecycle suspend endpoint (remediation actuator),
//! and the factors endpoint (MFA audit).

pub mod logs;
pub mod mfa;
pub mod users;

pub use mfa::{MfaFinding, OktaFactor, OktaUser};

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::Client;
use std::time::Duration;
use thiserror::Error;

use crate::config::OktaConfig;

/// Errors from the Okta API client
#[derive(Error, Debug)]
pub enum OktaError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Okta API returned status {status} for {endpoint}")]
    Api {
        status: reqwest::StatusCode,
        endpoint: String,
    },

    #[error("Invalid client configuration: {0}")]
    Config(String),
}

pub struct OktaClient {
    http: Client,
    base_url: String,
}

impl OktaClient {
    /// Build a client for an org. The SSWS token goes into default headers;
    /// requests time out after 20 seconds.
    pub fn new(config: &OktaConfig) -> Result<Self, OktaError> {
        let mut headers = HeaderMap::new();
        let auth = HeaderValue::from_str(&format!("SSWS {}", config.api_token))
            .map_err(|_| OktaError::Config("api token contains invalid characters".to_string()))?;
        headers.insert(AUTHORIZATION, auth);
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let http = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(20))
            .build()?;

        Ok(OktaClient {
            http,
            base_url: format!("{}/api/v1", config.org_url.trim_end_matches('/')),
        })
    }

    pub(crate) fn http(&self) -> &Client {
        &self.http
    }

    pub(crate) fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}
