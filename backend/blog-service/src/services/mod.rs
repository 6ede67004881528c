/// Business logic layer for blog-service
///
/// This module provides high-level operations:
/// - Listing service: filtered, ordered, paginated article lists
/// - Article service: create, detail, update and delete of articles
/// - Comment service: threaded comment trees and posting
/// - Counter service: atomic view and like counters
pub mod articles;
pub mod comments;
pub mod counters;
pub mod listing;

// Re-export commonly used services
pub use articles::{ArticleDetail, ArticleForm, ArticleService, AvatarUpload, EditForm};
pub use comments::{build_comment_tree, CommentService};
pub use counters::CounterService;
pub use listing::{ArticlePage, ListingParams, ListingService, PageInfo, Paginator};
