/// Database access layer
///
/// This module provides:
/// - Pool creation with embedded migrations
/// - Repository functions for articles, columns, tags and comments
///
/// Repository functions are generic over the executor so the same query can
/// run against the pool or inside a transaction.
pub mod article_repo;
pub mod column_repo;
pub mod comment_repo;
pub mod tag_repo;

use db_pool::{create_pool, DbConfig};
use sqlx::migrate::Migrator;
use sqlx::SqlitePool;

/// Schema migrations embedded at compile time
pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Create the pool and bring the schema up to date
pub async fn connect(config: DbConfig) -> anyhow::Result<SqlitePool> {
    let pool = create_pool(config).await?;
    db_pool::migrate(&pool, &MIGRATOR).await?;
    Ok(pool)
}
