use crate::db::article_repo;
use crate::error::{AppError, Result};
use crate::metrics::articles::{ARTICLE_LIKES_TOTAL, ARTICLE_VIEWS_TOTAL};
use sqlx::SqlitePool;

/// View and like counters
///
/// Both counters are single `UPDATE ... SET n = n + 1 ... RETURNING n`
/// statements, so concurrent requests never lose increments. Neither touches
/// `updated_at`.
#[derive(Clone)]
pub struct CounterService {
    pool: SqlitePool,
}

impl CounterService {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Add one view and return the new total
    pub async fn record_view(&self, article_id: i64) -> Result<i64> {
        let views = article_repo::increment_views(&self.pool, article_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("article {}", article_id)))?;

        ARTICLE_VIEWS_TOTAL.inc();
        Ok(views)
    }

    /// Add one like and return the new total
    pub async fn increase_likes(&self, article_id: i64) -> Result<i64> {
        let likes = article_repo::increment_likes(&self.pool, article_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("article {}", article_id)))?;

        ARTICLE_LIKES_TOTAL.inc();
        tracing::debug!(article_id, likes, "Article liked");
        Ok(likes)
    }
}
