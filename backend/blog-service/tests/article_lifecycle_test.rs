#[macro_use]
mod common;

use actix_web::{http::header, http::StatusCode, test};
use blog_service::db::tag_repo;
use common::{at, multipart, TestContext};
use serde_json::Value;

const PNG: &[u8] = b"\x89PNG\r\n\x1a\nnot really an image";

async fn article_count(ctx: &TestContext) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM articles")
        .fetch_one(&ctx.pool)
        .await
        .unwrap()
}

/// Files left under the avatar directory, at any depth
fn stored_avatars(ctx: &TestContext) -> usize {
    fn walk(dir: &std::path::Path) -> usize {
        let Ok(entries) = std::fs::read_dir(dir) else {
            return 0;
        };
        entries
            .flatten()
            .map(|entry| {
                let path = entry.path();
                if path.is_dir() {
                    walk(&path)
                } else {
                    1
                }
            })
            .sum()
    }
    walk(&ctx.media_dir.path().join("article"))
}

/// Make every tag write fail from here on
async fn reject_tag_writes(ctx: &TestContext) {
    sqlx::query(
        "CREATE TRIGGER reject_tag_writes BEFORE INSERT ON article_tags \
         BEGIN SELECT RAISE(ABORT, 'tag storage unavailable'); END",
    )
    .execute(&ctx.pool)
    .await
    .unwrap();
}

#[actix_web::test]
async fn test_authoring_requires_login() {
    let ctx = TestContext::new().await;
    let article = ctx.article_at(1, "title", "body", 0).await;
    let app = blog_app!(ctx);

    let req = test::TestRequest::get()
        .uri("/article/article-create/")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(
        resp.headers().get(header::LOCATION).unwrap(),
        "/userprofile/login/?next=/article/article-create/"
    );

    let (content_type, body) = multipart(&[("title", "t"), ("body", "b")], None);
    let req = test::TestRequest::post()
        .uri(&format!("/article/article-update/{}/", article.id))
        .insert_header((header::CONTENT_TYPE, content_type))
        .set_payload(body)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);

    assert_eq!(ctx.reload(article.id).await.unwrap().title, "title");
}

#[actix_web::test]
async fn test_create_article_with_tags_and_avatar() {
    let ctx = TestContext::new().await;
    let column = ctx.column("Rust").await;
    let app = blog_app!(ctx);

    let req = test::TestRequest::get()
        .uri("/article/article-create/")
        .insert_header(ctx.bearer(7))
        .to_request();
    let form: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(form["columns"][0]["title"], "Rust");

    let column_id = column.id.to_string();
    let (content_type, body) = multipart(
        &[
            ("title", "  Hello Rust  "),
            ("body", "# Intro\n\nSome text"),
            ("column", column_id.as_str()),
            ("tags", "rust, web, rust"),
        ],
        Some(("../../cat.png", PNG)),
    );
    let req = test::TestRequest::post()
        .uri("/article/article-create/")
        .insert_header(ctx.bearer(7))
        .insert_header((header::CONTENT_TYPE, content_type))
        .set_payload(body)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(
        resp.headers().get(header::LOCATION).unwrap(),
        "/article/article-list/"
    );

    let id: i64 = sqlx::query_scalar("SELECT id FROM articles")
        .fetch_one(&ctx.pool)
        .await
        .unwrap();
    let article = ctx.reload(id).await.unwrap();
    assert_eq!(article.author_id, 7);
    assert_eq!(article.title, "Hello Rust");
    assert_eq!(article.column_id, Some(column.id));
    assert_eq!(article.total_views, 0);
    assert_eq!(article.likes, 0);

    let avatar = article.avatar.expect("avatar stored");
    assert!(avatar.starts_with("article/"));
    assert!(avatar.ends_with("/cat.png"));
    assert!(ctx.media_dir.path().join(&avatar).exists());

    let tags = tag_repo::tags_for_article(&ctx.pool, id).await.unwrap();
    assert_eq!(tags, vec!["rust", "web"]);
}

#[actix_web::test]
async fn test_invalid_create_persists_nothing() {
    let ctx = TestContext::new().await;
    let app = blog_app!(ctx);

    let cases: Vec<(Vec<(&str, &str)>, Option<(&str, &[u8])>)> = vec![
        (vec![("title", "   "), ("body", "body")], None),
        (vec![("title", "title"), ("body", "")], None),
        (vec![("title", "title"), ("body", "body"), ("column", "999")], None),
        (vec![("title", "title"), ("body", "body"), ("column", "abc")], None),
        (
            vec![("title", "title"), ("body", "body")],
            Some(("evil.sh", b"#!/bin/sh".as_slice())),
        ),
    ];

    for (fields, file) in cases {
        let (content_type, body) = multipart(&fields, file);
        let req = test::TestRequest::post()
            .uri("/article/article-create/")
            .insert_header(ctx.bearer(1))
            .insert_header((header::CONTENT_TYPE, content_type))
            .set_payload(body)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK, "fields {:?}", fields);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["form_invalid"], true);
    }

    assert_eq!(article_count(&ctx).await, 0);
    assert!(!ctx.media_dir.path().join("article").exists());
}

#[actix_web::test]
async fn test_detail_counts_views_for_non_authors_only() {
    let ctx = TestContext::new().await;
    let article = ctx.article_at(1, "title", "## Part one\n\ntext", 0).await;
    let app = blog_app!(ctx);
    let uri = format!("/article/article-detail/{}/", article.id);

    let req = test::TestRequest::get().uri(&uri).to_request();
    let detail: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(detail["article"]["total_views"], 1);
    assert_eq!(detail["toc"][0]["id"], "part-one");
    assert!(detail["html"]
        .as_str()
        .unwrap()
        .contains(r#"<h2 id="part-one">"#));

    let req = test::TestRequest::get()
        .uri(&uri)
        .insert_header(ctx.bearer(1))
        .to_request();
    let detail: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(detail["article"]["total_views"], 1);

    let req = test::TestRequest::get()
        .uri(&uri)
        .insert_header(ctx.bearer(2))
        .to_request();
    let detail: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(detail["article"]["total_views"], 2);

    let stored = ctx.reload(article.id).await.unwrap();
    assert_eq!(stored.total_views, 2);
    assert_eq!(stored.updated_at, article.updated_at);

    let req = test::TestRequest::get()
        .uri("/article/article-detail/424242/")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn test_neighbour_navigation_by_id() {
    let ctx = TestContext::new().await;
    for id in [3_i64, 5, 9] {
        sqlx::query(
            "INSERT INTO articles (id, author_id, title, body, created_at, updated_at) \
             VALUES (?, 1, ?, 'body', ?, ?)",
        )
        .bind(id)
        .bind(format!("article {}", id))
        .bind(at(id))
        .bind(at(id))
        .execute(&ctx.pool)
        .await
        .unwrap();
    }
    let app = blog_app!(ctx);

    let detail = |id: i64| {
        test::TestRequest::get()
            .uri(&format!("/article/article-detail/{}/", id))
            .to_request()
    };

    let middle: Value = test::call_and_read_body_json(&app, detail(5)).await;
    assert_eq!(middle["previous"]["id"], 3);
    assert_eq!(middle["next"]["id"], 9);
    assert_eq!(middle["next"]["title"], "article 9");

    let first: Value = test::call_and_read_body_json(&app, detail(3)).await;
    assert!(first["previous"].is_null());
    assert_eq!(first["next"]["id"], 5);

    let last: Value = test::call_and_read_body_json(&app, detail(9)).await;
    assert_eq!(last["previous"]["id"], 5);
    assert!(last["next"].is_null());
}

#[actix_web::test]
async fn test_owner_update_keeps_tags_unless_avatar_given() {
    let ctx = TestContext::new().await;
    let article = ctx
        .article_with(1, "Old title", "old body", 0, None, &["old"])
        .await;
    let app = blog_app!(ctx);
    let uri = format!("/article/article-update/{}/", article.id);

    let req = test::TestRequest::get()
        .uri(&uri)
        .insert_header(ctx.bearer(1))
        .to_request();
    let form: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(form["title"], "Old title");
    assert_eq!(form["tags"], "old");

    let (content_type, body) = multipart(
        &[("title", "New title"), ("body", "new body"), ("tags", "a, b")],
        None,
    );
    let req = test::TestRequest::post()
        .uri(&uri)
        .insert_header(ctx.bearer(1))
        .insert_header((header::CONTENT_TYPE, content_type))
        .set_payload(body)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(
        resp.headers().get(header::LOCATION).unwrap().to_str().unwrap(),
        format!("/article/article-detail/{}/", article.id)
    );

    let updated = ctx.reload(article.id).await.unwrap();
    assert_eq!(updated.title, "New title");
    assert_eq!(updated.body, "new body");
    assert!(updated.updated_at > article.updated_at);
    assert_eq!(updated.created_at, article.created_at);
    let tags = tag_repo::tags_for_article(&ctx.pool, article.id).await.unwrap();
    assert_eq!(tags, vec!["old"]);

    let (content_type, body) = multipart(
        &[("title", "New title"), ("body", "new body"), ("tags", "a b")],
        Some(("cover.jpg", PNG)),
    );
    let req = test::TestRequest::post()
        .uri(&uri)
        .insert_header(ctx.bearer(1))
        .insert_header((header::CONTENT_TYPE, content_type))
        .set_payload(body)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);

    let updated = ctx.reload(article.id).await.unwrap();
    let avatar = updated.avatar.expect("avatar replaced");
    assert!(avatar.ends_with("cover.jpg"));
    let tags = tag_repo::tags_for_article(&ctx.pool, article.id).await.unwrap();
    assert_eq!(tags, vec!["a", "b"]);
}

#[actix_web::test]
async fn test_non_owner_update_is_forbidden_and_mutates_nothing() {
    let ctx = TestContext::new().await;
    let article = ctx
        .article_with(1, "Mine", "my body", 0, None, &["keep"])
        .await;
    let app = blog_app!(ctx);
    let uri = format!("/article/article-update/{}/", article.id);

    let req = test::TestRequest::get()
        .uri(&uri)
        .insert_header(ctx.bearer(2))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let (content_type, body) = multipart(
        &[("title", "Stolen"), ("body", "defaced"), ("tags", "spam")],
        Some(("spam.png", PNG)),
    );
    let req = test::TestRequest::post()
        .uri(&uri)
        .insert_header(ctx.bearer(2))
        .insert_header((header::CONTENT_TYPE, content_type))
        .set_payload(body)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    let text = test::read_body(resp).await;
    assert_eq!(text, "Sorry, you are not allowed to modify this article.");

    let stored = ctx.reload(article.id).await.unwrap();
    assert_eq!(stored.title, "Mine");
    assert_eq!(stored.body, "my body");
    assert_eq!(stored.avatar, None);
    assert_eq!(stored.updated_at, article.updated_at);
    let tags = tag_repo::tags_for_article(&ctx.pool, article.id).await.unwrap();
    assert_eq!(tags, vec!["keep"]);
    assert!(!ctx.media_dir.path().join("article").exists());
}

#[actix_web::test]
async fn test_safe_delete_requires_post_and_cascades() {
    let ctx = TestContext::new().await;
    let article = ctx
        .article_with(1, "doomed", "body", 0, None, &["gone"])
        .await;
    sqlx::query(
        "INSERT INTO comments (article_id, user_id, body, created_at) VALUES (?, 2, 'hi', ?)",
    )
    .bind(article.id)
    .bind(at(1))
    .execute(&ctx.pool)
    .await
    .unwrap();
    let app = blog_app!(ctx);
    let uri = format!("/article/article-safe-delete/{}/", article.id);

    let req = test::TestRequest::get().uri(&uri).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(test::read_body(resp).await, "POST required");
    assert!(ctx.reload(article.id).await.is_some());

    let req = test::TestRequest::post().uri(&uri).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(
        resp.headers().get(header::LOCATION).unwrap(),
        "/article/article-list/"
    );
    assert!(ctx.reload(article.id).await.is_none());

    let comments: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM comments")
        .fetch_one(&ctx.pool)
        .await
        .unwrap();
    let tags: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM article_tags")
        .fetch_one(&ctx.pool)
        .await
        .unwrap();
    assert_eq!((comments, tags), (0, 0));

    let req = test::TestRequest::post().uri(&uri).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn test_likes_columns_and_health() {
    let ctx = TestContext::new().await;
    ctx.column("Python").await;
    let article = ctx.article_at(1, "liked", "body", 0).await;
    let app = blog_app!(ctx);

    for _ in 0..2 {
        let req = test::TestRequest::post()
            .uri(&format!("/article/increase-likes/{}/", article.id))
            .to_request();
        let body = test::call_and_read_body(&app, req).await;
        assert_eq!(body, "success");
    }
    let stored = ctx.reload(article.id).await.unwrap();
    assert_eq!(stored.likes, 2);
    assert_eq!(stored.updated_at, article.updated_at);

    let req = test::TestRequest::post()
        .uri("/article/increase-likes/999/")
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::NOT_FOUND
    );

    let req = test::TestRequest::get().uri("/article/columns/").to_request();
    let columns: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(columns[0]["title"], "Python");

    let req = test::TestRequest::get().uri("/health").to_request();
    let health: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(health["status"], "ok");
}

#[actix_web::test]
async fn test_create_rolls_back_when_tag_write_fails() {
    let ctx = TestContext::new().await;
    reject_tag_writes(&ctx).await;
    let app = blog_app!(ctx);

    let (content_type, body) = multipart(
        &[("title", "Atomic"), ("body", "body"), ("tags", "rust, web")],
        Some(("cat.png", PNG)),
    );
    let req = test::TestRequest::post()
        .uri("/article/article-create/")
        .insert_header(ctx.bearer(1))
        .insert_header((header::CONTENT_TYPE, content_type))
        .set_payload(body)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

    assert_eq!(article_count(&ctx).await, 0);
    assert_eq!(stored_avatars(&ctx), 0);
}

#[actix_web::test]
async fn test_avatar_update_rolls_back_when_tag_write_fails() {
    let ctx = TestContext::new().await;
    let article = ctx
        .article_with(3, "Before", "old body", 0, None, &["old"])
        .await;
    reject_tag_writes(&ctx).await;
    let app = blog_app!(ctx);

    let (content_type, body) = multipart(
        &[("title", "After"), ("body", "new body"), ("tags", "new")],
        Some(("dog.png", PNG)),
    );
    let req = test::TestRequest::post()
        .uri(&format!("/article/article-update/{}/", article.id))
        .insert_header(ctx.bearer(3))
        .insert_header((header::CONTENT_TYPE, content_type))
        .set_payload(body)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let reloaded = ctx.reload(article.id).await.unwrap();
    assert_eq!(reloaded.title, "Before");
    assert_eq!(reloaded.body, "old body");
    assert_eq!(reloaded.avatar, None);
    assert_eq!(reloaded.updated_at, article.updated_at);
    assert_eq!(
        tag_repo::tags_for_article(&ctx.pool, article.id).await.unwrap(),
        vec!["old"]
    );
    assert_eq!(stored_avatars(&ctx), 0);
}
