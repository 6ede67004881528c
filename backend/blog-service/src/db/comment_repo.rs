use crate::models::{Comment, NewComment};
use chrono::{DateTime, Utc};
use sqlx::{Executor, Sqlite};

/// Create a new comment on an article
pub async fn create_comment<'e, E>(
    executor: E,
    comment: &NewComment,
    now: DateTime<Utc>,
) -> Result<Comment, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_as::<_, Comment>(
        r#"
        INSERT INTO comments (article_id, user_id, body, created_at, parent_id, reply_to)
        VALUES (?, ?, ?, ?, ?, ?)
        RETURNING id, article_id, user_id, body, created_at, parent_id, reply_to
        "#,
    )
    .bind(comment.article_id)
    .bind(comment.user_id)
    .bind(&comment.body)
    .bind(now)
    .bind(comment.parent_id)
    .bind(comment.reply_to)
    .fetch_one(executor)
    .await
}

/// Get a single comment by ID
pub async fn get_comment_by_id<'e, E>(executor: E, comment_id: i64) -> Result<Option<Comment>, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_as::<_, Comment>(
        r#"
        SELECT id, article_id, user_id, body, created_at, parent_id, reply_to
        FROM comments
        WHERE id = ?
        "#,
    )
    .bind(comment_id)
    .fetch_optional(executor)
    .await
}

/// Every comment of an article, oldest first
pub async fn get_comments_by_article<'e, E>(
    executor: E,
    article_id: i64,
) -> Result<Vec<Comment>, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_as::<_, Comment>(
        r#"
        SELECT id, article_id, user_id, body, created_at, parent_id, reply_to
        FROM comments
        WHERE article_id = ?
        ORDER BY created_at ASC, id ASC
        "#,
    )
    .bind(article_id)
    .fetch_all(executor)
    .await
}
