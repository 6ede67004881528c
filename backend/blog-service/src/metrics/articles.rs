use lazy_static::lazy_static;
use prometheus::{register_int_counter, register_int_counter_vec, IntCounter, IntCounterVec};

lazy_static! {
    /// Article detail views counted towards `total_views`.
    pub static ref ARTICLE_VIEWS_TOTAL: IntCounter = register_int_counter!(
        "blog_article_views_total",
        "Article views recorded for non-author readers"
    )
    .expect("failed to register blog_article_views_total");

    /// Likes added through the like endpoint.
    pub static ref ARTICLE_LIKES_TOTAL: IntCounter = register_int_counter!(
        "blog_article_likes_total",
        "Likes added to articles"
    )
    .expect("failed to register blog_article_likes_total");

    /// Article writes by operation (create, update, delete).
    pub static ref ARTICLE_WRITES_TOTAL: IntCounterVec = register_int_counter_vec!(
        "blog_article_writes_total",
        "Article writes segmented by operation",
        &["operation"]
    )
    .expect("failed to register blog_article_writes_total");

    /// Comments posted, segmented by kind (root, reply).
    pub static ref COMMENTS_CREATED_TOTAL: IntCounterVec = register_int_counter_vec!(
        "blog_comments_created_total",
        "Comments posted segmented by kind",
        &["kind"]
    )
    .expect("failed to register blog_comments_created_total");
}
