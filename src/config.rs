use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while validating configuration at startup
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("okta.org_url and okta.api_token must be configured (or set OKTA_ORG_URL / OKTA_API_TOKEN)")]
    MissingCredentials,

    #[error("work hours must satisfy 0 <= start < end <= 24, got {start}..{end}")]
    InvalidWorkHours { start: u32, end: u32 },
}

/// Configuration for the OktaGuard daemon
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Okta API connection
    pub okta: OktaConfig,
    /// Detection rules configuration
    pub detection: DetectionConfig,
    /// Automated remediation configuration
    pub remediation: RemediationConfig,
    /// Scan loop configuration
    pub scanner: ScannerConfig,
    /// Persistent storage configuration
    pub storage: StorageConfig,
    /// Admin API configuration
    pub api: ApiConfig,
}

/// Okta API connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OktaConfig {
    /// Organization base URL, e.g. https://example.okta.com
    pub org_url: String,
    /// SSWS API token
    pub api_token: String,
}

/// Detection rules configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    /// Failed attempts needed to flag a brute force
    pub brute_force_threshold: usize,
    /// Sliding window for failed attempts, in minutes
    pub brute_force_window_min: i64,
    /// First working hour (inclusive, 0-23)
    pub work_hour_start: u32,
    /// End of working hours (exclusive, 0-24)
    pub work_hour_end: u32,
    /// Fixed UTC offset (hours) for the business-hours rule.
    /// Unset means the process-local time zone is used.
    pub work_hours_utc_offset: Option<i32>,
}

/// Automated remediation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RemediationConfig {
    /// Auto-suspend accounts on critical brute-force alerts
    pub suspend_on_high_risk: bool,
}

/// Scan loop configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScannerConfig {
    /// Seconds between scheduled scans
    pub scan_interval_seconds: u64,
}

/// Persistent storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Path to the SQLite database file
    pub db_path: PathBuf,
}

/// Admin API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Bind address for the admin HTTP server
    pub bind_address: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            okta: OktaConfig::default(),
            detection: DetectionConfig::default(),
            remediation: RemediationConfig::default(),
            scanner: ScannerConfig::default(),
            storage: StorageConfig::default(),
            api: ApiConfig::default(),
        }
    }
}

impl Default for OktaConfig {
    fn default() -> Self {
        OktaConfig {
            org_url: String::new(),
            api_token: String::new(),
        }
    }
}

impl Default for DetectionConfig {
    fn default() -> Self {
        DetectionConfig {
            brute_force_threshold: 5,
            brute_force_window_min: 5,
            work_hour_start: 9,
            work_hour_end: 18,
            work_hours_utc_offset: None,
        }
    }
}

impl Default for RemediationConfig {
    fn default() -> Self {
        RemediationConfig {
            suspend_on_high_risk: true,
        }
    }
}

impl Default for ScannerConfig {
    fn default() -> Self {
        ScannerConfig {
            scan_interval_seconds: 60,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        StorageConfig {
            db_path: PathBuf::from("oktaguard.db"),
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        ApiConfig {
            bind_address: "127.0.0.1:3000".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn from_file(path: &PathBuf) -> Result<Self, Box<dyn std::error::Error>> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Save configuration to a file
    pub fn to_file(&self, path: &PathBuf) -> Result<(), Box<dyn std::error::Error>> {
        let contents = toml::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Override credentials from the environment (OKTA_ORG_URL, OKTA_API_TOKEN)
    pub fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var("OKTA_ORG_URL") {
            self.okta.org_url = url;
        }
        if let Ok(token) = std::env::var("OKTA_API_TOKEN") {
            self.okta.api_token = token;
        }
    }

    /// Check that the configuration is usable. Missing credentials are the
    /// only fatal startup error.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.okta.org_url.is_empty() || self.okta.api_token.is_empty() {
            return Err(ConfigError::MissingCredentials);
        }
        let (start, end) = (self.detection.work_hour_start, self.detection.work_hour_end);
        if start >= end || end > 24 {
            return Err(ConfigError::InvalidWorkHours { start, end });
        }
        Ok(())
    }
}
