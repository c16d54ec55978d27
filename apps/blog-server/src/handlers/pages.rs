//! Static pages and health check.

use actix_web::HttpResponse;
use serde::Serialize;

use blog_shared::pages::AboutPage;

/// GET /about/
pub async fn about() -> HttpResponse {
    HttpResponse::Ok().json(AboutPage {
        title: "About".to_string(),
        body: "A small blog. Posts are written by its authors; comments appear once a moderator approves them.".to_string(),
    })
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub timestamp: String,
}

/// GET /health
pub async fn health_check() -> HttpResponse {
    HttpResponse::Ok().json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}
