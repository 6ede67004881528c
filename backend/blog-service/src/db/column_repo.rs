use crate::models::ArticleColumn;
use chrono::{DateTime, Utc};
use sqlx::{Executor, Sqlite};

/// Create a new column
pub async fn create_column<'e, E>(
    executor: E,
    title: &str,
    now: DateTime<Utc>,
) -> Result<ArticleColumn, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_as::<_, ArticleColumn>(
        r#"
        INSERT INTO article_columns (title, created_at)
        VALUES (?, ?)
        RETURNING id, title, created_at
        "#,
    )
    .bind(title)
    .bind(now)
    .fetch_one(executor)
    .await
}

/// Get a column by ID
pub async fn find_column<'e, E>(executor: E, column_id: i64) -> Result<Option<ArticleColumn>, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_as::<_, ArticleColumn>(
        "SELECT id, title, created_at FROM article_columns WHERE id = ?",
    )
    .bind(column_id)
    .fetch_optional(executor)
    .await
}

/// All columns, newest first
pub async fn list_columns<'e, E>(executor: E) -> Result<Vec<ArticleColumn>, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_as::<_, ArticleColumn>(
        "SELECT id, title, created_at FROM article_columns ORDER BY created_at DESC, id DESC",
    )
    .fetch_all(executor)
    .await
}
