use crate::db::column_repo;
use crate::error::Result;
use actix_web::{web, HttpResponse};
use sqlx::SqlitePool;

/// List all columns, newest first
pub async fn list_columns(pool: web::Data<SqlitePool>) -> Result<HttpResponse> {
    let columns = column_repo::list_columns(pool.get_ref()).await?;
    Ok(HttpResponse::Ok().json(columns))
}
