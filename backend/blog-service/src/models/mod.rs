/// Data models for blog-service
///
/// This module defines structures for:
/// - ArticleColumn: Named grouping an article may belong to
/// - Article: Blog posts with tags, counters and an optional avatar
/// - Comment: Threaded comments on articles
/// - Listing filters and ordering used by the query layer
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Column ("category") an article may be filed under
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct ArticleColumn {
    pub id: i64,
    pub title: String,
    pub created_at: DateTime<Utc>,
}

/// Blog article
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Article {
    pub id: i64,
    pub author_id: i64,
    pub title: String,
    pub body: String,
    pub total_views: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub column_id: Option<i64>,
    /// Path relative to the media root
    pub avatar: Option<String>,
    pub likes: i64,
    /// Sorted tag names, loaded separately from `article_tags`
    #[sqlx(skip)]
    #[serde(default)]
    pub tags: Vec<String>,
}

impl Article {
    /// True when the article was created less than a minute before `now`.
    /// Articles dated in the future are never recent.
    pub fn was_created_recently(&self, now: DateTime<Utc>) -> bool {
        let age = now - self.created_at;
        age >= Duration::zero() && age < Duration::seconds(60)
    }
}

/// Fields of a new article row
#[derive(Debug, Clone)]
pub struct NewArticle {
    pub author_id: i64,
    pub title: String,
    pub body: String,
    pub column_id: Option<i64>,
    pub avatar: Option<String>,
}

/// Minimal article reference used for previous/next navigation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct ArticleLink {
    pub id: i64,
    pub title: String,
}

/// Comment on an article
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Comment {
    pub id: i64,
    pub article_id: i64,
    pub user_id: i64,
    pub body: String,
    pub created_at: DateTime<Utc>,
    pub parent_id: Option<i64>,
    /// User the comment answers, set on replies
    pub reply_to: Option<i64>,
}

/// Fields of a new comment row
#[derive(Debug, Clone)]
pub struct NewComment {
    pub article_id: i64,
    pub user_id: i64,
    pub body: String,
    pub parent_id: Option<i64>,
    pub reply_to: Option<i64>,
}

/// Comment with its replies, ordered by creation time
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommentNode {
    #[serde(flatten)]
    pub comment: Comment,
    pub children: Vec<CommentNode>,
}

/// Sort order for article listings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ArticleOrder {
    /// Newest first
    #[default]
    Created,
    /// Most viewed first
    TotalViews,
}

impl ArticleOrder {
    /// Map the `order` query parameter; anything but `total_views` is the default
    pub fn from_param(value: Option<&str>) -> Self {
        match value {
            Some("total_views") => ArticleOrder::TotalViews,
            _ => ArticleOrder::Created,
        }
    }
}

/// Filters applied to article listings. `None` means "do not filter".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArticleFilter {
    pub search: Option<String>,
    pub column_id: Option<i64>,
    pub tag: Option<String>,
}
