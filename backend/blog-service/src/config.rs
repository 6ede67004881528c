/// Configuration management for Blog Service
///
/// Configuration is loaded once from environment variables at startup and
/// shared read-only with every request through `web::Data<Config>`.
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

const DEV_JWT_SECRET: &str = "development-only-secret-change-me-0123456789";
const MIN_JWT_SECRET_LEN: usize = 32;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Application settings
    pub app: AppConfig,
    /// Database configuration
    pub database: DatabaseConfig,
    /// Identity and login redirect
    pub auth: AuthConfig,
    /// Uploaded file storage
    pub media: MediaConfig,
    /// Article listing
    pub listing: ListingConfig,
}

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Application environment (development, staging, production)
    pub env: String,
    /// Server host to bind to
    pub host: String,
    /// Server port to bind to
    pub port: u16,
    /// Number of HTTP worker threads
    pub workers: usize,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Database URL
    pub url: String,
    /// Max connections in pool
    pub max_connections: u32,
}

/// Authentication configuration
#[derive(Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// HS256 secret used to verify bearer tokens
    #[serde(skip_serializing)]
    pub jwt_secret: String,
    /// Where anonymous users are sent when an action needs a login
    pub login_url: String,
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("jwt_secret", &"[REDACTED]")
            .field("login_url", &self.login_url)
            .finish()
    }
}

/// Media storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaConfig {
    /// Directory uploaded files are written under
    pub root: PathBuf,
    /// Public URL prefix the media directory is served from
    pub url: String,
}

/// Listing configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListingConfig {
    /// Articles per page
    pub page_size: i64,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            app: AppConfig {
                env: "development".to_string(),
                host: "0.0.0.0".to_string(),
                port: 8000,
                workers: 4,
            },
            database: DatabaseConfig {
                url: "sqlite://blog.db?mode=rwc".to_string(),
                max_connections: 5,
            },
            auth: AuthConfig {
                jwt_secret: DEV_JWT_SECRET.to_string(),
                login_url: "/userprofile/login/".to_string(),
            },
            media: MediaConfig {
                root: PathBuf::from("media"),
                url: "/media/".to_string(),
            },
            listing: ListingConfig { page_size: 3 },
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, String> {
        let defaults = Config::default();
        let app_env = std::env::var("APP_ENV").unwrap_or_else(|_| defaults.app.env.clone());
        let production = app_env.eq_ignore_ascii_case("production");

        let jwt_secret = match std::env::var("JWT_SECRET") {
            Ok(value) => value,
            Err(_) if production => {
                return Err("JWT_SECRET must be set in production".to_string());
            }
            Err(_) => defaults.auth.jwt_secret.clone(),
        };
        if jwt_secret.len() < MIN_JWT_SECRET_LEN {
            return Err(format!(
                "JWT_SECRET must be at least {} bytes",
                MIN_JWT_SECRET_LEN
            ));
        }

        let page_size: i64 = parse_env_or_default("PAGE_SIZE", defaults.listing.page_size)?;
        if page_size < 1 {
            return Err("PAGE_SIZE must be at least 1".to_string());
        }

        let workers: usize = parse_env_or_default("HTTP_WORKERS", defaults.app.workers)?;
        if workers == 0 {
            return Err("HTTP_WORKERS must be at least 1".to_string());
        }

        let mut media_url =
            std::env::var("MEDIA_URL").unwrap_or_else(|_| defaults.media.url.clone());
        if !media_url.ends_with('/') {
            media_url.push('/');
        }

        Ok(Config {
            app: AppConfig {
                env: app_env,
                host: std::env::var("BLOG_SERVICE_HOST")
                    .unwrap_or_else(|_| defaults.app.host.clone()),
                port: parse_env_or_default("BLOG_SERVICE_PORT", defaults.app.port)?,
                workers,
            },
            database: DatabaseConfig {
                url: std::env::var("DATABASE_URL")
                    .unwrap_or_else(|_| defaults.database.url.clone()),
                max_connections: parse_env_or_default(
                    "DB_MAX_CONNECTIONS",
                    defaults.database.max_connections,
                )?,
            },
            auth: AuthConfig {
                jwt_secret,
                login_url: std::env::var("LOGIN_URL")
                    .unwrap_or_else(|_| defaults.auth.login_url.clone()),
            },
            media: MediaConfig {
                root: std::env::var("MEDIA_ROOT")
                    .map(PathBuf::from)
                    .unwrap_or(defaults.media.root),
                url: media_url,
            },
            listing: ListingConfig { page_size },
        })
    }

    pub fn is_production(&self) -> bool {
        self.app.env.eq_ignore_ascii_case("production")
    }
}

fn parse_env_or_default<T>(key: &str, default: T) -> Result<T, String>
where
    T: std::str::FromStr,
    T::Err: fmt::Display,
{
    match std::env::var(key) {
        Ok(val) => val
            .trim()
            .parse()
            .map_err(|e| format!("Failed to parse {}='{}': {}", key, val, e)),
        Err(_) => Ok(default),
    }
}
