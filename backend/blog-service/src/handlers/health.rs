use actix_web::{web, HttpResponse};
use sqlx::SqlitePool;

/// Liveness plus a database round trip
pub async fn health_check(pool: web::Data<SqlitePool>) -> HttpResponse {
    match sqlx::query("SELECT 1").execute(pool.get_ref()).await {
        Ok(_) => HttpResponse::Ok().json(serde_json::json!({
            "status": "ok",
            "service": "blog-service",
            "version": env!("CARGO_PKG_VERSION")
        })),
        Err(e) => HttpResponse::ServiceUnavailable().json(serde_json::json!({
            "status": "unhealthy",
            "error": format!("database check failed: {}", e),
            "service": "blog-service"
        })),
    }
}
