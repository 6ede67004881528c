/// Article handlers - HTTP endpoints for article operations
use crate::config::Config;
use crate::error::{AppError, Result};
use crate::media::MediaStore;
use crate::middleware::UserId;
use crate::models::Article;
use crate::services::{
    ArticleForm, ArticleService, AvatarUpload, CounterService, ListingParams, ListingService,
    PageInfo,
};
use actix_multipart::form::{tempfile::TempFile, text::Text, MultipartForm};
use actix_web::{http::header, http::Method, web, HttpRequest, HttpResponse};
use serde::Serialize;
use sqlx::SqlitePool;

/// Multipart body of the create and update forms
#[derive(MultipartForm)]
pub struct ArticleUpload {
    pub title: Option<Text<String>>,
    pub body: Option<Text<String>>,
    pub column: Option<Text<String>>,
    pub tags: Option<Text<String>>,
    #[multipart(limit = "10MB")]
    pub avatar: Option<TempFile>,
}

impl ArticleUpload {
    /// Split into form fields and the uploaded file. An empty file part or a
    /// part without a file name counts as "no avatar".
    fn into_parts(self) -> (ArticleForm, Option<TempFile>) {
        let form = ArticleForm {
            title: self.title.map(|t| t.0).unwrap_or_default(),
            body: self.body.map(|t| t.0).unwrap_or_default(),
            column: self.column.map(|t| t.0),
            tags: self.tags.map(|t| t.0),
        };
        let avatar = self
            .avatar
            .filter(|file| file.size > 0 && file.file_name.as_deref().is_some_and(|n| !n.is_empty()));
        (form, avatar)
    }
}

fn avatar_upload(file: &TempFile) -> Option<AvatarUpload> {
    Some(AvatarUpload {
        file_name: file.file_name.clone()?,
        path: file.file.path().to_path_buf(),
    })
}

#[derive(Debug, Serialize)]
pub struct ArticleSummary {
    #[serde(flatten)]
    pub article: Article,
    pub avatar_url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ArticleListResponse {
    pub articles: Vec<ArticleSummary>,
    pub page: PageInfo,
    pub search: String,
    pub order: String,
    pub column: String,
    pub tag: String,
}

fn redirect(location: String) -> HttpResponse {
    HttpResponse::Found()
        .insert_header((header::LOCATION, location))
        .finish()
}

/// Paginated, filterable article list
pub async fn article_list(
    pool: web::Data<SqlitePool>,
    config: web::Data<Config>,
    media: web::Data<MediaStore>,
    query: web::Query<ListingParams>,
) -> Result<HttpResponse> {
    let service = ListingService::new((**pool).clone(), config.listing.page_size);
    let page = service.list(&query).await?;

    let articles = page
        .articles
        .into_iter()
        .map(|article| ArticleSummary {
            avatar_url: article.avatar.as_deref().map(|a| media.url_for(a)),
            article,
        })
        .collect();

    Ok(HttpResponse::Ok().json(ArticleListResponse {
        articles,
        page: page.page,
        search: page.search,
        order: page.order,
        column: page.column,
        tag: page.tag,
    }))
}

/// Article detail; counts a view unless the reader is the author
pub async fn article_detail(
    pool: web::Data<SqlitePool>,
    media: web::Data<MediaStore>,
    article_id: web::Path<i64>,
    user_id: Option<UserId>,
) -> Result<HttpResponse> {
    let service = ArticleService::new((**pool).clone(), media.get_ref().clone());
    let detail = service
        .article_detail(article_id.into_inner(), user_id.map(|u| u.0))
        .await?;

    Ok(HttpResponse::Ok().json(detail))
}

/// Context for the create form
pub async fn create_article_form(
    _user_id: UserId,
    pool: web::Data<SqlitePool>,
    media: web::Data<MediaStore>,
) -> Result<HttpResponse> {
    let service = ArticleService::new((**pool).clone(), media.get_ref().clone());
    let columns = service.create_form().await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({ "columns": columns })))
}

/// Create a new article
pub async fn create_article(
    user_id: UserId,
    pool: web::Data<SqlitePool>,
    media: web::Data<MediaStore>,
    MultipartForm(upload): MultipartForm<ArticleUpload>,
) -> Result<HttpResponse> {
    let (form, file) = upload.into_parts();
    let avatar = file.as_ref().and_then(avatar_upload);

    let service = ArticleService::new((**pool).clone(), media.get_ref().clone());
    service.create_article(user_id.0, form, avatar).await?;

    Ok(redirect("/article/article-list/".to_string()))
}

/// Current values of an article for its author
pub async fn update_article_form(
    user_id: UserId,
    pool: web::Data<SqlitePool>,
    media: web::Data<MediaStore>,
    article_id: web::Path<i64>,
) -> Result<HttpResponse> {
    let service = ArticleService::new((**pool).clone(), media.get_ref().clone());
    let form = service.edit_form(article_id.into_inner(), user_id.0).await?;

    Ok(HttpResponse::Ok().json(form))
}

/// Update an article's content, and with a new avatar also its tags
pub async fn update_article(
    user_id: UserId,
    pool: web::Data<SqlitePool>,
    media: web::Data<MediaStore>,
    article_id: web::Path<i64>,
    MultipartForm(upload): MultipartForm<ArticleUpload>,
) -> Result<HttpResponse> {
    let article_id = article_id.into_inner();
    let (form, file) = upload.into_parts();
    let avatar = file.as_ref().and_then(avatar_upload);

    let service = ArticleService::new((**pool).clone(), media.get_ref().clone());
    service
        .update_article(article_id, user_id.0, form, avatar)
        .await?;

    Ok(redirect(format!("/article/article-detail/{}/", article_id)))
}

/// Delete an article. Only POST is accepted.
pub async fn safe_delete_article(
    req: HttpRequest,
    pool: web::Data<SqlitePool>,
    media: web::Data<MediaStore>,
    article_id: web::Path<i64>,
) -> Result<HttpResponse> {
    if req.method() != Method::POST {
        return Err(AppError::MethodNotAllowed);
    }

    let service = ArticleService::new((**pool).clone(), media.get_ref().clone());
    service.delete_article(article_id.into_inner()).await?;

    Ok(redirect("/article/article-list/".to_string()))
}

/// Add one like
pub async fn increase_likes(
    pool: web::Data<SqlitePool>,
    article_id: web::Path<i64>,
) -> Result<HttpResponse> {
    CounterService::new((**pool).clone())
        .increase_likes(article_id.into_inner())
        .await?;

    Ok(HttpResponse::Ok()
        .content_type("text/plain; charset=utf-8")
        .body("success"))
}
