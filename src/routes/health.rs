use actix_web::{get, web, HttpResponse, Responder};
use chrono::Utc;
use serde_json::json;

use crate::context::AppContext;

/// Health check endpoint
///
/// Returns the current status of the API and timestamp. Answers 503 when the store
/// cannot be reached.
#[get("/health")]
pub async fn health(ctx: web::Data<AppContext>) -> impl Responder {
    match ctx.store().health_check().await {
        Ok(()) => HttpResponse::Ok().json(json!({
            "status": "ok",
            "timestamp": Utc::now()
        })),
        Err(e) => {
            log::warn!("{} store unavailable: {}", ctx.store().backend_name(), e);
            HttpResponse::ServiceUnavailable().json(json!({
                "status": "unavailable",
                "timestamp": Utc::now()
            }))
        }
    }
}
