use std::path::PathBuf;
use structopt::StructOpt;

use oktaguard::config::Config;
use oktaguard::okta::OktaClient;
use oktaguard::persistence::{SqliteStateStore, StateStore};

/// OktaGuard command line interface
#[derive(StructOpt, Debug)]
#[structopt(name = "oktaguard", about = "Okta log risk monitor CLI")]
pub enum Cli {
    /// Generate a default configuration file
    Config {
        /// Output path for the configuration file
        #[structopt(short, long, default_value = "config.toml")]
        output: PathBuf,
    },
    /// List recent alerts from the alert log
    Alerts {
        /// Path to configuration file
        #[structopt(short, long, default_value = "config.toml")]
        config: PathBuf,
        /// Number of alerts to show
        #[structopt(short, long, default_value = "20")]
        limit: usize,
    },
    /// Audit user MFA factor enrollment and list weak accounts
    MfaAudit {
        /// Path to configuration file
        #[structopt(short, long, default_value = "config.toml")]
        config: PathBuf,
    },
}

fn load_config(path: &PathBuf) -> Result<Config, Box<dyn std::error::Error>> {
    let mut config = if path.exists() {
        Config::from_file(path)?
    } else {
        Config::default()
    };
    config.apply_env_overrides();
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();
    env_logger::Builder::from_default_env().init();

    let cli = Cli::from_args();

    match cli {
        Cli::Config { output } => {
            let config = Config::default();
            config.to_file(&output)?;
            println!("Default configuration written to: {:?}", output);
        }
        Cli::Alerts { config, limit } => {
            let config = load_config(&config)?;
            let store = SqliteStateStore::new(&config.storage.db_path)?;

            let alerts = store.list_alerts(limit)?;
            println!("{} alert(s):\n", alerts.len());
            for alert in alerts {
                println!(
                    "  [{}] {} - {} (account: {}, user: {}, action: {})",
                    alert.severity.as_str(),
                    alert.risk_type.as_str(),
                    alert.description,
                    alert.account_id.as_deref().unwrap_or("-"),
                    alert.username.as_deref().unwrap_or("-"),
                    alert
                        .action_taken
                        .map(|a| a.as_str())
                        .unwrap_or("none"),
                );
            }
        }
        Cli::MfaAudit { config } => {
            let config = load_config(&config)?;
            config.validate()?;
            let okta = OktaClient::new(&config.okta)?;

            let findings = okta.audit_mfa().await?;
            if findings.is_empty() {
                println!("No users with weak MFA enrollment found");
            } else {
                println!("{} user(s) with weak MFA enrollment:\n", findings.len());
                for finding in findings {
                    println!(
                        "  {} ({}) - {} [{} factor(s)]",
                        finding.user_id,
                        finding.login.as_deref().unwrap_or("unknown"),
                        finding.reason,
                        finding.factor_count,
                    );
                }
            }
        }
    }

    Ok(())
}
