/// Article service - handles article creation, retrieval, editing and deletion
use crate::db::{article_repo, column_repo, tag_repo};
use crate::error::{AppError, Result};
use crate::markdown::{self, TocEntry};
use crate::media::MediaStore;
use crate::metrics::articles::ARTICLE_WRITES_TOTAL;
use crate::middleware::check_article_ownership;
use crate::models::{Article, ArticleColumn, ArticleLink, CommentNode, NewArticle};
use crate::services::{CommentService, CounterService};
use crate::tags;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use std::collections::BTreeSet;
use std::path::PathBuf;
use tracing::{info, warn};
use validator::Validate;

/// Submitted article fields, shared by create and update
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct ArticleForm {
    #[validate(length(min = 1, max = 100, message = "title must be 1 to 100 characters"))]
    pub title: String,
    #[validate(length(min = 1, message = "body must not be empty"))]
    pub body: String,
    /// Column id, or empty / `none` for no column
    pub column: Option<String>,
    pub tags: Option<String>,
}

impl ArticleForm {
    fn cleaned(mut self) -> Result<Self> {
        self.title = self.title.trim().to_string();
        self.body = self.body.trim().to_string();
        self.validate()?;
        Ok(self)
    }

    fn parsed_tags(&self) -> Result<BTreeSet<String>> {
        tags::parse_and_validate(self.tags.as_deref().unwrap_or_default())
    }
}

/// Uploaded title image waiting to be stored
#[derive(Debug, Clone)]
pub struct AvatarUpload {
    /// File name as sent by the client
    pub file_name: String,
    /// Where the upload was spooled to
    pub path: PathBuf,
}

/// Everything the detail page shows
#[derive(Debug, Clone, Serialize)]
pub struct ArticleDetail {
    pub article: Article,
    pub avatar_url: Option<String>,
    /// Posted less than a minute ago
    pub created_recently: bool,
    pub column: Option<ArticleColumn>,
    pub html: String,
    pub toc: Vec<TocEntry>,
    pub comments: Vec<CommentNode>,
    pub previous: Option<ArticleLink>,
    pub next: Option<ArticleLink>,
}

/// Values used to pre-fill the edit form
#[derive(Debug, Clone, Serialize)]
pub struct EditForm {
    pub id: i64,
    pub title: String,
    pub body: String,
    pub column_id: Option<i64>,
    pub avatar: Option<String>,
    pub avatar_url: Option<String>,
    /// Comma-joined tag names
    pub tags: String,
    pub columns: Vec<ArticleColumn>,
}

pub struct ArticleService {
    pool: SqlitePool,
    media: MediaStore,
}

impl ArticleService {
    pub fn new(pool: SqlitePool, media: MediaStore) -> Self {
        Self { pool, media }
    }

    /// Columns offered by the create form
    pub async fn create_form(&self) -> Result<Vec<ArticleColumn>> {
        Ok(column_repo::list_columns(&self.pool).await?)
    }

    /// Create an article with its tags in one transaction
    pub async fn create_article(
        &self,
        author_id: i64,
        form: ArticleForm,
        avatar: Option<AvatarUpload>,
    ) -> Result<Article> {
        let form = form.cleaned()?;
        let tags = form.parsed_tags()?;
        let column_id = self.resolve_column(form.column.as_deref()).await?;

        let avatar = self.store_avatar(avatar).await?;
        let new_article = NewArticle {
            author_id,
            title: form.title,
            body: form.body,
            column_id,
            avatar: avatar.clone(),
        };

        let created = self.insert_with_tags(&new_article, &tags).await;
        let mut article = match created {
            Ok(article) => article,
            Err(e) => {
                self.discard_avatar(avatar.as_deref()).await;
                return Err(e);
            }
        };
        article.tags = tags.into_iter().collect();

        ARTICLE_WRITES_TOTAL.with_label_values(&["create"]).inc();
        info!(article_id = article.id, author_id, "Article created");
        Ok(article)
    }

    async fn insert_with_tags(
        &self,
        new_article: &NewArticle,
        tags: &BTreeSet<String>,
    ) -> Result<Article> {
        let mut tx = self.pool.begin().await?;
        let article = article_repo::insert_article(&mut *tx, new_article, Utc::now()).await?;
        tag_repo::add_tags(&mut tx, article.id, tags).await?;
        tx.commit().await?;
        Ok(article)
    }

    /// Load an article for display. Readers other than the author add a view.
    pub async fn article_detail(&self, article_id: i64, viewer: Option<i64>) -> Result<ArticleDetail> {
        let mut article = article_repo::find_article(&self.pool, article_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("article {}", article_id)))?;

        if viewer != Some(article.author_id) {
            article.total_views = CounterService::new(self.pool.clone())
                .record_view(article_id)
                .await?;
        }

        article.tags = tag_repo::tags_for_article(&self.pool, article_id).await?;

        let column = match article.column_id {
            Some(column_id) => column_repo::find_column(&self.pool, column_id).await?,
            None => None,
        };
        let rendered = markdown::render(&article.body);
        let comments = CommentService::new(self.pool.clone())
            .comment_tree(article_id)
            .await?;
        let previous = article_repo::previous_article(&self.pool, article_id).await?;
        let next = article_repo::next_article(&self.pool, article_id).await?;

        Ok(ArticleDetail {
            avatar_url: article.avatar.as_deref().map(|a| self.media.url_for(a)),
            created_recently: article.was_created_recently(Utc::now()),
            article,
            column,
            html: rendered.html,
            toc: rendered.toc,
            comments,
            previous,
            next,
        })
    }

    /// Current values of an article for its author to edit
    pub async fn edit_form(&self, article_id: i64, user_id: i64) -> Result<EditForm> {
        let article = self.owned_article(article_id, user_id).await?;
        let tag_names = tag_repo::tags_for_article(&self.pool, article_id).await?;
        let columns = column_repo::list_columns(&self.pool).await?;

        Ok(EditForm {
            id: article.id,
            avatar_url: article.avatar.as_deref().map(|a| self.media.url_for(a)),
            title: article.title,
            body: article.body,
            column_id: article.column_id,
            avatar: article.avatar,
            tags: tags::join_tags(&tag_names),
            columns,
        })
    }

    /// Overwrite title and body. A new avatar also replaces the whole tag set;
    /// without one the tags are left as they are.
    pub async fn update_article(
        &self,
        article_id: i64,
        user_id: i64,
        form: ArticleForm,
        avatar: Option<AvatarUpload>,
    ) -> Result<Article> {
        let existing = self.owned_article(article_id, user_id).await?;
        let form = form.cleaned()?;
        let tags = form.parsed_tags()?;

        let new_avatar = self.store_avatar(avatar).await?;
        let updated = self
            .write_update(article_id, &form, new_avatar.as_deref(), &tags)
            .await;
        if let Err(e) = updated {
            self.discard_avatar(new_avatar.as_deref()).await;
            return Err(e);
        }

        if new_avatar.is_some() && existing.avatar != new_avatar {
            self.discard_avatar(existing.avatar.as_deref()).await;
        }

        let mut article = article_repo::find_article(&self.pool, article_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("article {}", article_id)))?;
        article.tags = tag_repo::tags_for_article(&self.pool, article_id).await?;

        ARTICLE_WRITES_TOTAL.with_label_values(&["update"]).inc();
        info!(article_id, user_id, "Article updated");
        Ok(article)
    }

    async fn write_update(
        &self,
        article_id: i64,
        form: &ArticleForm,
        new_avatar: Option<&str>,
        tags: &BTreeSet<String>,
    ) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        let found =
            article_repo::update_content(&mut *tx, article_id, &form.title, &form.body, Utc::now())
                .await?;
        if !found {
            return Err(AppError::NotFound(format!("article {}", article_id)));
        }

        if let Some(avatar) = new_avatar {
            article_repo::update_avatar(&mut *tx, article_id, avatar).await?;
            tag_repo::replace_tags(&mut tx, article_id, tags).await?;
        }

        tx.commit().await?;
        Ok(())
    }

    /// Delete an article with its comments and tags. No ownership check.
    pub async fn delete_article(&self, article_id: i64) -> Result<()> {
        let avatar = article_repo::delete_article(&self.pool, article_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("article {}", article_id)))?;

        self.discard_avatar(avatar.as_deref()).await;

        ARTICLE_WRITES_TOTAL.with_label_values(&["delete"]).inc();
        info!(article_id, "Article deleted");
        Ok(())
    }

    async fn owned_article(&self, article_id: i64, user_id: i64) -> Result<Article> {
        let article = article_repo::find_article(&self.pool, article_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("article {}", article_id)))?;

        if let Err(e) = check_article_ownership(user_id, &article) {
            warn!(article_id, user_id, "Rejected edit by non-author");
            return Err(e);
        }
        Ok(article)
    }

    async fn resolve_column(&self, raw: Option<&str>) -> Result<Option<i64>> {
        let raw = raw.map(str::trim).unwrap_or_default();
        if raw.is_empty() || raw.eq_ignore_ascii_case("none") {
            return Ok(None);
        }

        let column_id: i64 = raw
            .parse()
            .map_err(|_| AppError::Validation(format!("invalid column '{}'", raw)))?;

        match column_repo::find_column(&self.pool, column_id).await? {
            Some(column) => Ok(Some(column.id)),
            None => Err(AppError::Validation(format!(
                "column {} does not exist",
                column_id
            ))),
        }
    }

    async fn store_avatar(&self, upload: Option<AvatarUpload>) -> Result<Option<String>> {
        match upload {
            Some(upload) => {
                let path = self
                    .media
                    .save_avatar(&upload.file_name, &upload.path, Utc::now().date_naive())
                    .await?;
                Ok(Some(path))
            }
            None => Ok(None),
        }
    }

    async fn discard_avatar(&self, relative: Option<&str>) {
        if let Some(relative) = relative {
            if let Err(e) = self.media.remove(relative).await {
                warn!(path = %relative, error = %e, "Failed to remove avatar");
            }
        }
    }
}
