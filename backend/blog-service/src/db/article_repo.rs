use crate::models::{Article, ArticleFilter, ArticleLink, ArticleOrder, NewArticle};
use chrono::{DateTime, Utc};
use sqlx::{Executor, QueryBuilder, Sqlite};

const ARTICLE_COLUMNS: &str = "a.id, a.author_id, a.title, a.body, a.total_views, a.created_at, \
     a.updated_at, a.column_id, a.avatar, a.likes";

/// Insert a new article and return the stored row
pub async fn insert_article<'e, E>(
    executor: E,
    article: &NewArticle,
    now: DateTime<Utc>,
) -> Result<Article, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_as::<_, Article>(
        r#"
        INSERT INTO articles (author_id, title, body, title_folded, body_folded,
                              column_id, avatar, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        RETURNING id, author_id, title, body, total_views, created_at, updated_at,
                  column_id, avatar, likes
        "#,
    )
    .bind(article.author_id)
    .bind(&article.title)
    .bind(&article.body)
    .bind(fold(&article.title))
    .bind(fold(&article.body))
    .bind(article.column_id)
    .bind(&article.avatar)
    .bind(now)
    .bind(now)
    .fetch_one(executor)
    .await
}

/// Get an article by ID (tags are not loaded)
pub async fn find_article<'e, E>(executor: E, article_id: i64) -> Result<Option<Article>, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_as::<_, Article>(
        r#"
        SELECT id, author_id, title, body, total_views, created_at, updated_at,
               column_id, avatar, likes
        FROM articles
        WHERE id = ?
        "#,
    )
    .bind(article_id)
    .fetch_optional(executor)
    .await
}

/// Check whether an article exists
pub async fn article_exists<'e, E>(executor: E, article_id: i64) -> Result<bool, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    let found: Option<i64> = sqlx::query_scalar("SELECT id FROM articles WHERE id = ?")
        .bind(article_id)
        .fetch_optional(executor)
        .await?;

    Ok(found.is_some())
}

/// Overwrite title and body; this is a content write so `updated_at` moves
pub async fn update_content<'e, E>(
    executor: E,
    article_id: i64,
    title: &str,
    body: &str,
    now: DateTime<Utc>,
) -> Result<bool, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query(
        r#"
        UPDATE articles
        SET title = ?, body = ?, title_folded = ?, body_folded = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(title)
    .bind(body)
    .bind(fold(title))
    .bind(fold(body))
    .bind(now)
    .bind(article_id)
    .execute(executor)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Replace the avatar path
pub async fn update_avatar<'e, E>(
    executor: E,
    article_id: i64,
    avatar: &str,
) -> Result<bool, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query("UPDATE articles SET avatar = ? WHERE id = ?")
        .bind(avatar)
        .bind(article_id)
        .execute(executor)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// Delete an article; comments and tag rows cascade.
///
/// Returns `None` when no such article exists, otherwise the avatar path the
/// article pointed to.
pub async fn delete_article<'e, E>(
    executor: E,
    article_id: i64,
) -> Result<Option<Option<String>>, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_scalar::<_, Option<String>>("DELETE FROM articles WHERE id = ? RETURNING avatar")
        .bind(article_id)
        .fetch_optional(executor)
        .await
}

/// Atomically add one view. Does not touch `updated_at`.
pub async fn increment_views<'e, E>(executor: E, article_id: i64) -> Result<Option<i64>, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_scalar(
        "UPDATE articles SET total_views = total_views + 1 WHERE id = ? RETURNING total_views",
    )
    .bind(article_id)
    .fetch_optional(executor)
    .await
}

/// Atomically add one like. Does not touch `updated_at`.
pub async fn increment_likes<'e, E>(executor: E, article_id: i64) -> Result<Option<i64>, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_scalar("UPDATE articles SET likes = likes + 1 WHERE id = ? RETURNING likes")
        .bind(article_id)
        .fetch_optional(executor)
        .await
}

/// Article with the largest id strictly below `article_id`
pub async fn previous_article<'e, E>(
    executor: E,
    article_id: i64,
) -> Result<Option<ArticleLink>, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_as::<_, ArticleLink>(
        "SELECT id, title FROM articles WHERE id < ? ORDER BY id DESC LIMIT 1",
    )
    .bind(article_id)
    .fetch_optional(executor)
    .await
}

/// Article with the smallest id strictly above `article_id`
pub async fn next_article<'e, E>(
    executor: E,
    article_id: i64,
) -> Result<Option<ArticleLink>, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_as::<_, ArticleLink>(
        "SELECT id, title FROM articles WHERE id > ? ORDER BY id ASC LIMIT 1",
    )
    .bind(article_id)
    .fetch_optional(executor)
    .await
}

/// Count articles matching a filter
pub async fn count_articles<'e, E>(executor: E, filter: &ArticleFilter) -> Result<i64, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    let mut builder = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM articles a WHERE 1 = 1");
    push_filters(&mut builder, filter);

    builder.build_query_scalar::<i64>().fetch_one(executor).await
}

/// Fetch one window of articles matching a filter (tags are not loaded)
pub async fn list_articles<'e, E>(
    executor: E,
    filter: &ArticleFilter,
    order: ArticleOrder,
    limit: i64,
    offset: i64,
) -> Result<Vec<Article>, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    let mut builder = QueryBuilder::<Sqlite>::new("SELECT ");
    builder.push(ARTICLE_COLUMNS);
    builder.push(" FROM articles a WHERE 1 = 1");
    push_filters(&mut builder, filter);

    builder.push(match order {
        ArticleOrder::Created => " ORDER BY a.created_at DESC, a.id DESC",
        ArticleOrder::TotalViews => " ORDER BY a.total_views DESC, a.created_at DESC, a.id DESC",
    });
    builder.push(" LIMIT ");
    builder.push_bind(limit);
    builder.push(" OFFSET ");
    builder.push_bind(offset);

    builder.build_query_as::<Article>().fetch_all(executor).await
}

fn push_filters(builder: &mut QueryBuilder<'_, Sqlite>, filter: &ArticleFilter) {
    if let Some(search) = &filter.search {
        let pattern = format!("%{}%", escape_like(&fold(search)));
        builder.push(r" AND (a.title_folded LIKE ");
        builder.push_bind(pattern.clone());
        builder.push(r" ESCAPE '\' OR a.body_folded LIKE ");
        builder.push_bind(pattern);
        builder.push(r" ESCAPE '\')");
    }

    if let Some(column_id) = filter.column_id {
        builder.push(" AND a.column_id = ");
        builder.push_bind(column_id);
    }

    if let Some(tag) = &filter.tag {
        builder.push(
            " AND EXISTS (SELECT 1 FROM article_tags t WHERE t.article_id = a.id AND t.tag_name = ",
        );
        builder.push_bind(tag.clone());
        builder.push(")");
    }
}

/// Unicode lowercase form stored next to title and body. SQLite's own
/// `LIKE` folding covers ASCII only.
fn fold(text: &str) -> String {
    text.to_lowercase()
}

/// Escape LIKE wildcards so user input matches literally
fn escape_like(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for ch in input.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}
