//! Shared fixtures for blog-service integration tests.
#![allow(dead_code, unused_macros)]

use blog_service::db::{self, article_repo, column_repo, tag_repo};
use blog_service::media::MediaStore;
use blog_service::middleware::Claims;
use blog_service::models::{Article, ArticleColumn, NewArticle};
use blog_service::Config;
use chrono::{DateTime, Duration, TimeZone, Utc};
use db_pool::DbConfig;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use sqlx::SqlitePool;
use std::collections::BTreeSet;
use tempfile::TempDir;

pub const BOUNDARY: &str = "----blogservicetestboundary";

pub struct TestContext {
    pub pool: SqlitePool,
    pub config: Config,
    pub media: MediaStore,
    pub media_dir: TempDir,
}

impl TestContext {
    pub async fn new() -> Self {
        let pool = db::connect(DbConfig::in_memory("blog-service-test"))
            .await
            .expect("in-memory database");
        Self::with_pool(pool)
    }

    pub fn with_pool(pool: SqlitePool) -> Self {
        let media_dir = TempDir::new().expect("media dir");
        let mut config = Config::default();
        config.media.root = media_dir.path().to_path_buf();
        let media = MediaStore::new(media_dir.path(), config.media.url.clone());

        Self {
            pool,
            config,
            media,
            media_dir,
        }
    }

    /// `Authorization` header value for a user
    pub fn bearer(&self, user_id: i64) -> (&'static str, String) {
        let now = Utc::now().timestamp() as usize;
        let claims = Claims {
            sub: user_id.to_string(),
            exp: now + 3600,
            iat: now,
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.config.auth.jwt_secret.as_bytes()),
        )
        .expect("token");
        ("Authorization", format!("Bearer {}", token))
    }

    pub async fn column(&self, title: &str) -> ArticleColumn {
        column_repo::create_column(&self.pool, title, Utc::now())
            .await
            .expect("column")
    }

    /// Insert an article created `minutes` after a fixed epoch
    pub async fn article_at(
        &self,
        author_id: i64,
        title: &str,
        body: &str,
        minutes: i64,
    ) -> Article {
        self.article_with(author_id, title, body, minutes, None, &[])
            .await
    }

    pub async fn article_with(
        &self,
        author_id: i64,
        title: &str,
        body: &str,
        minutes: i64,
        column_id: Option<i64>,
        tags: &[&str],
    ) -> Article {
        let new_article = NewArticle {
            author_id,
            title: title.to_string(),
            body: body.to_string(),
            column_id,
            avatar: None,
        };
        let article = article_repo::insert_article(&self.pool, &new_article, at(minutes))
            .await
            .expect("article");

        let tags: BTreeSet<String> = tags.iter().map(|t| t.to_string()).collect();
        let mut conn = self.pool.acquire().await.expect("connection");
        tag_repo::add_tags(&mut conn, article.id, &tags)
            .await
            .expect("tags");

        article
    }

    pub async fn reload(&self, article_id: i64) -> Option<Article> {
        article_repo::find_article(&self.pool, article_id)
            .await
            .expect("query")
    }
}

/// Fixed point in time plus an offset in minutes
pub fn at(minutes: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, 1, 12, 0, 0).unwrap() + Duration::minutes(minutes)
}

/// Build a multipart/form-data body. Returns the content type and the body.
pub fn multipart(fields: &[(&str, &str)], file: Option<(&str, &[u8])>) -> (String, Vec<u8>) {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        body.extend_from_slice(
            format!("Content-Disposition: form-data; name=\"{}\"\r\n", name).as_bytes(),
        );
        body.extend_from_slice(b"Content-Type: text/plain; charset=utf-8\r\n\r\n");
        body.extend_from_slice(value.as_bytes());
        body.extend_from_slice(b"\r\n");
    }
    if let Some((file_name, bytes)) = file {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"avatar\"; filename=\"{}\"\r\n",
                file_name
            )
            .as_bytes(),
        );
        body.extend_from_slice(b"Content-Type: image/png\r\n\r\n");
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());

    (format!("multipart/form-data; boundary={}", BOUNDARY), body)
}

/// Initialise the full application against a test context
macro_rules! blog_app {
    ($ctx:expr) => {
        actix_web::test::init_service(
            actix_web::App::new()
                .app_data(actix_web::web::Data::new($ctx.pool.clone()))
                .app_data(actix_web::web::Data::new($ctx.config.clone()))
                .app_data(actix_web::web::Data::new($ctx.media.clone()))
                .wrap(blog_service::middleware::JwtAuthMiddleware::new(
                    &$ctx.config.auth.jwt_secret,
                ))
                .configure(blog_service::handlers::configure),
        )
        .await
    };
}
