/// Comment handlers - posting comments and replies
use crate::error::Result;
use crate::middleware::UserId;
use crate::services::CommentService;
use actix_web::{http::header, web, HttpResponse};
use serde::Deserialize;
use sqlx::SqlitePool;

#[derive(Debug, Deserialize)]
pub struct CommentForm {
    #[serde(default)]
    pub body: String,
}

/// Post a root comment on an article
pub async fn post_comment(
    user_id: UserId,
    pool: web::Data<SqlitePool>,
    article_id: web::Path<i64>,
    form: web::Form<CommentForm>,
) -> Result<HttpResponse> {
    let article_id = article_id.into_inner();
    CommentService::new((**pool).clone())
        .post_comment(article_id, user_id.0, &form.body, None)
        .await?;

    Ok(redirect_to_article(article_id))
}

/// Reply to an existing comment of the same article
pub async fn post_reply(
    user_id: UserId,
    pool: web::Data<SqlitePool>,
    path: web::Path<(i64, i64)>,
    form: web::Form<CommentForm>,
) -> Result<HttpResponse> {
    let (article_id, parent_id) = path.into_inner();
    CommentService::new((**pool).clone())
        .post_comment(article_id, user_id.0, &form.body, Some(parent_id))
        .await?;

    Ok(redirect_to_article(article_id))
}

fn redirect_to_article(article_id: i64) -> HttpResponse {
    HttpResponse::Found()
        .insert_header((
            header::LOCATION,
            format!("/article/article-detail/{}/", article_id),
        ))
        .finish()
}
