use sqlx::{Executor, QueryBuilder, Sqlite, SqliteConnection};
use std::collections::{BTreeSet, HashMap};

/// Sorted tag names of one article
pub async fn tags_for_article<'e, E>(executor: E, article_id: i64) -> Result<Vec<String>, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_scalar(
        "SELECT tag_name FROM article_tags WHERE article_id = ? ORDER BY tag_name ASC",
    )
    .bind(article_id)
    .fetch_all(executor)
    .await
}

/// Sorted tag names for a batch of articles, keyed by article id.
/// Articles without tags are absent from the map.
pub async fn tags_for_articles<'e, E>(
    executor: E,
    article_ids: &[i64],
) -> Result<HashMap<i64, Vec<String>>, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    if article_ids.is_empty() {
        return Ok(HashMap::new());
    }

    let mut builder =
        QueryBuilder::<Sqlite>::new("SELECT article_id, tag_name FROM article_tags WHERE article_id IN (");
    let mut separated = builder.separated(", ");
    for id in article_ids {
        separated.push_bind(*id);
    }
    separated.push_unseparated(") ORDER BY article_id ASC, tag_name ASC");

    let rows: Vec<(i64, String)> = builder.build_query_as().fetch_all(executor).await?;

    let mut tags: HashMap<i64, Vec<String>> = HashMap::new();
    for (article_id, tag_name) in rows {
        tags.entry(article_id).or_default().push(tag_name);
    }
    Ok(tags)
}

/// Add tags to an article, ignoring ones it already carries
pub async fn add_tags(
    conn: &mut SqliteConnection,
    article_id: i64,
    tags: &BTreeSet<String>,
) -> Result<(), sqlx::Error> {
    for tag in tags {
        sqlx::query("INSERT OR IGNORE INTO article_tags (article_id, tag_name) VALUES (?, ?)")
            .bind(article_id)
            .bind(tag)
            .execute(&mut *conn)
            .await?;
    }
    Ok(())
}

/// Clear the article's tag set, then set it to `tags`
pub async fn replace_tags(
    conn: &mut SqliteConnection,
    article_id: i64,
    tags: &BTreeSet<String>,
) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM article_tags WHERE article_id = ?")
        .bind(article_id)
        .execute(&mut *conn)
        .await?;

    add_tags(conn, article_id, tags).await
}
