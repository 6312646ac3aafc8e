//! HTTP surface
//!
//! `POST /calculate-risk` takes a request envelope and returns the assessment.
//! `GET /` and `GET /health` are static liveness checks.

use crate::error::RiskError;
use crate::pipeline::{ErrorRecord, RiskProcessor};
use actix_web::http::StatusCode;
use actix_web::{web, App, HttpResponse, HttpServer};
use serde_json::json;
use tracing::{info, warn};

/// Liveness payload
pub const HEALTH_STATUS: &str = "riskgate running";

/// HTTP status for a failed assessment
pub fn status_for(error: &RiskError) -> StatusCode {
    match error {
        e if e.is_validation() => StatusCode::BAD_REQUEST,
        RiskError::Classifier(_) | RiskError::ClassifierTimeout { .. } => {
            StatusCode::SERVICE_UNAVAILABLE
        }
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

async fn health() -> HttpResponse {
    HttpResponse::Ok().json(json!({ "status": HEALTH_STATUS }))
}

async fn calculate_risk(processor: web::Data<RiskProcessor>, body: String) -> HttpResponse {
    match processor.assess(&body) {
        Ok(assessment) => HttpResponse::Ok().json(assessment),
        Err(e) => {
            let status = status_for(&e);
            warn!(kind = e.kind(), status = status.as_u16(), error = %e, "assessment failed");
            HttpResponse::build(status).json(ErrorRecord::from(&e))
        }
    }
}

/// Register routes; shared by `serve` and tests
pub fn register_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(health))
        .route("/health", web::get().to(health))
        .route("/calculate-risk", web::post().to(calculate_risk));
}

/// Run the HTTP server until shutdown
pub async fn serve(processor: RiskProcessor, bind: &str, workers: usize) -> std::io::Result<()> {
    info!(%bind, workers, "starting HTTP surface");

    let data = web::Data::new(processor);
    HttpServer::new(move || App::new().app_data(data.clone()).configure(register_routes))
        .bind(bind)?
        .workers(workers.max(1))
        .run()
        .await
}
