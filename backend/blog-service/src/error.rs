/// Error types for Blog Service
///
/// Every error is converted to a user-visible response at the request
/// boundary. Form problems re-render with an inline message, missing logins
/// redirect, access denials are plain text and store failures are logged.
use actix_web::{
    error::ResponseError,
    http::{header, StatusCode},
    HttpResponse,
};
use thiserror::Error;

/// Result type for blog-service operations
pub type Result<T> = std::result::Result<T, AppError>;

/// Application error types
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Reading or writing an uploaded file failed
    #[error("Media storage error: {0}")]
    Media(#[from] std::io::Error),

    /// Submitted form is missing or has malformed fields
    #[error("Form invalid, please correct it and submit again: {0}")]
    Validation(String),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Action needs a logged-in user
    #[error("Login required")]
    Unauthorized { login_url: String },

    /// Logged in, but not allowed to do this
    #[error("{0}")]
    Forbidden(String),

    /// Route only accepts POST
    #[error("POST required")]
    MethodNotAllowed,

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Database(_) | AppError::Media(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            // Invalid forms are re-rendered, not rejected
            AppError::Validation(_) => StatusCode::OK,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Unauthorized { .. } => StatusCode::FOUND,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();

        match self {
            AppError::Unauthorized { login_url } => HttpResponse::Found()
                .insert_header((header::LOCATION, login_url.as_str()))
                .finish(),
            AppError::Forbidden(_) | AppError::MethodNotAllowed => HttpResponse::build(status)
                .content_type("text/plain; charset=utf-8")
                .body(self.to_string()),
            AppError::Validation(_) => HttpResponse::build(status).json(serde_json::json!({
                "error": self.to_string(),
                "form_invalid": true,
            })),
            AppError::Database(_) | AppError::Media(_) | AppError::Internal(_) => {
                tracing::error!(error = %self, "request failed");
                HttpResponse::build(status).json(serde_json::json!({
                    "error": self.to_string(),
                    "status": status.as_u16(),
                }))
            }
            AppError::NotFound(_) => HttpResponse::build(status).json(serde_json::json!({
                "error": self.to_string(),
                "status": status.as_u16(),
            })),
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        AppError::Validation(errors.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            AppError::Validation("title".into()).status_code(),
            StatusCode::OK
        );
        assert_eq!(
            AppError::NotFound("article 1".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::Forbidden("no".into()).status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            AppError::MethodNotAllowed.status_code(),
            StatusCode::METHOD_NOT_ALLOWED
        );
        assert_eq!(
            AppError::Database(sqlx::Error::RowNotFound).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_unauthorized_redirects_to_login() {
        let resp = AppError::Unauthorized {
            login_url: "/userprofile/login/?next=/article/article-create/".to_string(),
        }
        .error_response();

        assert_eq!(resp.status(), StatusCode::FOUND);
        assert_eq!(
            resp.headers().get(header::LOCATION).unwrap(),
            "/userprofile/login/?next=/article/article-create/"
        );
    }

    #[actix_web::test]
    async fn test_method_not_allowed_is_plain_text() {
        let resp = AppError::MethodNotAllowed.error_response();
        assert_eq!(
            resp.headers().get(header::CONTENT_TYPE).unwrap(),
            "text/plain; charset=utf-8"
        );

        let body = to_bytes(resp.into_body()).await.unwrap();
        assert_eq!(body, "POST required");
    }
}
