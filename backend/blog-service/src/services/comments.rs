/// Comment service - threaded comments on articles
use crate::db::{article_repo, comment_repo};
use crate::error::{AppError, Result};
use crate::metrics::articles::COMMENTS_CREATED_TOTAL;
use crate::models::{Comment, CommentNode, NewComment};
use chrono::Utc;
use sqlx::SqlitePool;
use std::collections::{HashMap, HashSet};

pub struct CommentService {
    pool: SqlitePool,
}

impl CommentService {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// All comments of an article as a tree, loaded with a single query
    pub async fn comment_tree(&self, article_id: i64) -> Result<Vec<CommentNode>> {
        let comments = comment_repo::get_comments_by_article(&self.pool, article_id).await?;
        Ok(build_comment_tree(comments))
    }

    /// Post a root comment, or a reply when `parent_id` is given.
    /// Replies are addressed to the parent comment's author.
    pub async fn post_comment(
        &self,
        article_id: i64,
        user_id: i64,
        body: &str,
        parent_id: Option<i64>,
    ) -> Result<Comment> {
        if !article_repo::article_exists(&self.pool, article_id).await? {
            return Err(AppError::NotFound(format!("article {}", article_id)));
        }

        let body = body.trim();
        if body.is_empty() {
            return Err(AppError::Validation("comment must not be empty".to_string()));
        }

        let reply_to = match parent_id {
            Some(parent_id) => {
                let parent = comment_repo::get_comment_by_id(&self.pool, parent_id)
                    .await?
                    .ok_or_else(|| AppError::NotFound(format!("comment {}", parent_id)))?;
                if parent.article_id != article_id {
                    return Err(AppError::Validation(format!(
                        "comment {} belongs to another article",
                        parent_id
                    )));
                }
                Some(parent.user_id)
            }
            None => None,
        };

        let comment = comment_repo::create_comment(
            &self.pool,
            &NewComment {
                article_id,
                user_id,
                body: body.to_string(),
                parent_id,
                reply_to,
            },
            Utc::now(),
        )
        .await?;

        let kind = if parent_id.is_some() { "reply" } else { "root" };
        COMMENTS_CREATED_TOTAL.with_label_values(&[kind]).inc();
        tracing::info!(comment_id = comment.id, article_id, user_id, kind, "Comment posted");

        Ok(comment)
    }
}

/// Arrange a flat comment list into a forest.
///
/// Siblings are ordered by `(created_at, id)`. Comments whose parent is not
/// in the list are treated as roots.
pub fn build_comment_tree(mut comments: Vec<Comment>) -> Vec<CommentNode> {
    comments.sort_by(|a, b| (a.created_at, a.id).cmp(&(b.created_at, b.id)));

    let ids: HashSet<i64> = comments.iter().map(|c| c.id).collect();
    let mut children: HashMap<i64, Vec<Comment>> = HashMap::new();
    let mut roots = Vec::new();

    for comment in comments {
        match comment.parent_id {
            Some(parent_id) if ids.contains(&parent_id) && parent_id != comment.id => {
                children.entry(parent_id).or_default().push(comment)
            }
            _ => roots.push(comment),
        }
    }

    roots
        .into_iter()
        .map(|root| attach_children(root, &mut children))
        .collect()
}

fn attach_children(comment: Comment, children: &mut HashMap<i64, Vec<Comment>>) -> CommentNode {
    let replies = children.remove(&comment.id).unwrap_or_default();
    CommentNode {
        children: replies
            .into_iter()
            .map(|reply| attach_children(reply, children))
            .collect(),
        comment,
    }
}
