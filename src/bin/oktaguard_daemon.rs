use std::env;
use std::path::PathBuf;
use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{middleware, web, App, HttpServer};
use tokio::sync::watch;

use oktaguard::api::{self, ApiContext};
use oktaguard::config::Config;
use oktaguard::detection::DetectionEngine;
use oktaguard::okta::OktaClient;
use oktaguard::persistence::SqliteStateStore;
use oktaguard::remediation::{RemediationTrigger, Remediator};
use oktaguard::worker::{LogSource, Scanner};

/// Main daemon entry point for OktaGuard
#[actix_web::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();

    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    log::info!("Starting OktaGuard daemon...");

    // Load configuration
    let config_path = env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("config.toml"));

    let mut config = if config_path.exists() {
        Config::from_file(&config_path)?
    } else {
        log::warn!("Config file not found, using defaults");
        Config::default()
    };
    config.apply_env_overrides();

    // Missing credentials are the only fatal startup error
    config.validate()?;

    let store = Arc::new(SqliteStateStore::new(&config.storage.db_path)?);
    let okta = Arc::new(OktaClient::new(&config.okta)?);

    let remediator: Arc<dyn Remediator> = okta.clone();
    let trigger = RemediationTrigger::new(
        config.remediation.suspend_on_high_risk,
        remediator.clone(),
    );
    let engine = Arc::new(DetectionEngine::new(&config.detection, store.clone(), trigger));

    let source: Arc<dyn LogSource> = okta.clone();
    let scanner = Arc::new(Scanner::new(
        source,
        engine,
        store.clone(),
        config.scanner.scan_interval_seconds,
    ));

    // Background scan loop, stopped when the HTTP server exits
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let scan_task = tokio::spawn(scanner.clone().run_loop(shutdown_rx));

    let bind_address = config.api.bind_address.clone();
    log::info!("OktaGuard API listening on http://{}", bind_address);

    let api_scanner = scanner.clone();
    let api_store = store.clone();
    let api_remediator = remediator.clone();
    HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allow_any_header()
            .max_age(3600);

        App::new()
            .wrap(middleware::Logger::default())
            .wrap(cors)
            .app_data(web::Data::new(ApiContext {
                scanner: api_scanner.clone(),
                store: api_store.clone(),
                remediator: api_remediator.clone(),
            }))
            .configure(api::configure)
    })
    .bind(&bind_address)?
    .run()
    .await?;

    let _ = shutdown_tx.send(true);
    let _ = scan_task.await;

    log::info!("OktaGuard daemon stopped");
    Ok(())
}
