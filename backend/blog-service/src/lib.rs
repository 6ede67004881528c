/// Blog Service Library
///
/// A personal blogging platform: articles filed under columns and tags,
/// threaded comments, likes, view counts and authenticated authoring.
///
/// # Modules
///
/// - `handlers`: HTTP request handlers and route registration
/// - `models`: Data structures for articles, columns and comments
/// - `services`: Business logic layer
/// - `db`: Database access layer and repositories
/// - `markdown`: Article body rendering with a table of contents
/// - `media`: Storage for uploaded title images
/// - `tags`: Tag input parsing
/// - `middleware`: Bearer token identity and request timing
/// - `error`: Error types and handling
/// - `config`: Configuration management
/// - `metrics`: Prometheus collectors
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod markdown;
pub mod media;
pub mod metrics;
pub mod middleware;
pub mod models;
pub mod services;
pub mod tags;

pub use config::Config;
pub use error::{AppError, Result};
