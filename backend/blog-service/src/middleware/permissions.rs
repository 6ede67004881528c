/// Authorization module for blog-service
///
/// Only the author of an article may edit it.
use crate::error::AppError;
use crate::models::Article;

/// Result type for permission checks
pub type PermissionResult = Result<(), AppError>;

/// Check if a user wrote an article
pub fn check_article_ownership(user_id: i64, article: &Article) -> PermissionResult {
    if article.author_id == user_id {
        Ok(())
    } else {
        Err(AppError::Forbidden(
            "Sorry, you are not allowed to modify this article.".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn article_by(author_id: i64) -> Article {
        let now = Utc::now();
        Article {
            id: 7,
            author_id,
            title: "t".into(),
            body: "b".into(),
            total_views: 0,
            created_at: now,
            updated_at: now,
            column_id: None,
            avatar: None,
            likes: 0,
            tags: Vec::new(),
        }
    }

    #[test]
    fn test_author_may_modify() {
        assert!(check_article_ownership(1, &article_by(1)).is_ok());
    }

    #[test]
    fn test_other_user_is_forbidden() {
        let err = check_article_ownership(2, &article_by(1)).unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }
}
