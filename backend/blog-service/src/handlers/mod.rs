/// HTTP handlers for blog endpoints
///
/// This module contains handlers for:
/// - Articles: listing, detail, create, update, delete and likes
/// - Columns: listing the available columns
/// - Comments: posting root comments and replies
/// - Health: liveness with a database round trip
pub mod articles;
pub mod columns;
pub mod comments;
pub mod health;

use crate::metrics::serve_metrics;
use actix_web::web;

// Re-export handler functions at module level
pub use articles::{
    article_detail, article_list, create_article, create_article_form, increase_likes,
    safe_delete_article, update_article, update_article_form,
};
pub use columns::list_columns;
pub use comments::{post_comment, post_reply};
pub use health::health_check;

/// Register every route of the service
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(article_list))
        .route("/health", web::get().to(health_check))
        .route("/metrics", web::get().to(serve_metrics))
        .service(
            web::scope("/article")
                .route("/article-list/", web::get().to(article_list))
                .route("/article-detail/{id}/", web::get().to(article_detail))
                .service(
                    web::resource("/article-create/")
                        .route(web::get().to(create_article_form))
                        .route(web::post().to(create_article)),
                )
                .service(
                    web::resource("/article-update/{id}/")
                        .route(web::get().to(update_article_form))
                        .route(web::post().to(update_article)),
                )
                .route("/article-safe-delete/{id}/", web::route().to(safe_delete_article))
                .route("/increase-likes/{id}/", web::post().to(increase_likes))
                .route("/columns/", web::get().to(list_columns)),
        )
        .service(
            web::scope("/comment")
                .route("/post-comment/{article_id}/", web::post().to(post_comment))
                .route(
                    "/post-comment/{article_id}/{parent_id}/",
                    web::post().to(post_reply),
                ),
        );
}
