//! Admin HTTP API
//!
//! Read-mostly surface over the same persisted documents the engine
//! writes: list alerts, manually remediate an account, trigger an
//! immediate rescan.

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

use crate::persistence::StateStore;
use crate::remediation::Remediator;
use crate::worker::Scanner;

const DEFAULT_ALERT_LIMIT: usize = 100;

/// Shared handles for the API handlers.
pub struct ApiContext {
    pub scanner: Arc<Scanner>,
    pub store: Arc<dyn StateStore>,
    pub remediator: Arc<dyn Remediator>,
}

#[derive(Debug, Deserialize)]
pub struct AlertsQuery {
    limit: Option<usize>,
}

/// GET /api/alerts
async fn list_alerts(
    ctx: web::Data<ApiContext>,
    query: web::Query<AlertsQuery>,
) -> HttpResponse {
    let limit = query.limit.unwrap_or(DEFAULT_ALERT_LIMIT);
    match ctx.store.list_alerts(limit) {
        Ok(alerts) => HttpResponse::Ok().json(alerts),
        Err(e) => HttpResponse::InternalServerError().json(json!({ "error": e.to_string() })),
    }
}

/// POST /api/remediate/{account_id}
async fn remediate(ctx: web::Data<ApiContext>, path: web::Path<String>) -> HttpResponse {
    let account_id = path.into_inner();
    if account_id.is_empty() {
        return HttpResponse::BadRequest().json(json!({ "error": "account id required" }));
    }

    if let Err(e) = ctx.remediator.suspend(&account_id).await {
        return HttpResponse::InternalServerError().json(json!({ "error": e.to_string() }));
    }

    match ctx.store.mark_account_remediated(&account_id) {
        Ok(updated) => HttpResponse::Ok().json(json!({
            "success": true,
            "alerts_updated": updated
        })),
        Err(e) => HttpResponse::InternalServerError().json(json!({ "error": e.to_string() })),
    }
}

/// POST /api/rescan
async fn rescan(ctx: web::Data<ApiContext>) -> HttpResponse {
    match ctx.scanner.run_once().await {
        Ok(alerts) => HttpResponse::Ok().json(json!({
            "success": true,
            "found": alerts.len()
        })),
        Err(e) => HttpResponse::InternalServerError().json(json!({ "error": e.to_string() })),
    }
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .route("/alerts", web::get().to(list_alerts))
            .route("/remediate/{account_id}", web::post().to(remediate))
            .route("/rescan", web::post().to(rescan)),
    );
}
