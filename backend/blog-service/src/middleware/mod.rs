/// HTTP middleware utilities for blog-service
///
/// Provides bearer-token identity resolution and simple request timing logs.
/// Authentication never rejects a request by itself: routes that need a user
/// ask for the `UserId` extractor, which turns a missing identity into a
/// redirect to the login page.
pub mod permissions;

pub use permissions::*;

use crate::config::Config;
use crate::error::AppError;
use actix_web::dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::{web, Error, FromRequest, HttpMessage, HttpRequest};
use futures::future::LocalBoxFuture;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use std::future::{ready, Ready};
use std::rc::Rc;
use std::sync::Arc;
use std::time::Instant;

const DEFAULT_LOGIN_URL: &str = "/userprofile/login/";

// =====================================================================
// JWT Authentication
// =====================================================================

/// Claims carried by bearer tokens. `sub` is the numeric user id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: usize,
    pub iat: usize,
}

/// Authenticated user identifier stored in request extensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UserId(pub i64);

/// Resolves `Authorization: Bearer <jwt>` (HS256) into a [`UserId`].
///
/// Requests without a usable token pass through anonymously.
#[derive(Clone)]
pub struct JwtAuthMiddleware {
    decoding_key: Arc<DecodingKey>,
    validation: Arc<Validation>,
}

impl JwtAuthMiddleware {
    pub fn new(secret: &str) -> Self {
        Self {
            decoding_key: Arc::new(DecodingKey::from_secret(secret.as_bytes())),
            validation: Arc::new(Validation::new(Algorithm::HS256)),
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for JwtAuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = JwtAuthMiddlewareService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(JwtAuthMiddlewareService {
            service: Rc::new(service),
            decoding_key: self.decoding_key.clone(),
            validation: self.validation.clone(),
        }))
    }
}

pub struct JwtAuthMiddlewareService<S> {
    service: Rc<S>,
    decoding_key: Arc<DecodingKey>,
    validation: Arc<Validation>,
}

impl<S> JwtAuthMiddlewareService<S> {
    fn resolve_user(&self, req: &ServiceRequest) -> Option<UserId> {
        let header = req.headers().get("Authorization")?.to_str().ok()?;
        let token = header.strip_prefix("Bearer ")?;

        let data = match decode::<Claims>(token, &self.decoding_key, &self.validation) {
            Ok(data) => data,
            Err(e) => {
                tracing::debug!(error = %e, "Ignoring invalid bearer token");
                return None;
            }
        };

        match data.claims.sub.parse::<i64>() {
            Ok(id) => Some(UserId(id)),
            Err(_) => {
                tracing::debug!(sub = %data.claims.sub, "Token subject is not a user id");
                None
            }
        }
    }
}

impl<S, B> Service<ServiceRequest> for JwtAuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        if let Some(user_id) = self.resolve_user(&req) {
            req.extensions_mut().insert(user_id);
        }

        let service = self.service.clone();
        Box::pin(async move { service.call(req).await })
    }
}

impl FromRequest for UserId {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut actix_web::dev::Payload) -> Self::Future {
        ready(req.extensions().get::<UserId>().copied().ok_or_else(|| {
            let login_url = req
                .app_data::<web::Data<Config>>()
                .map(|config| config.auth.login_url.clone())
                .unwrap_or_else(|| DEFAULT_LOGIN_URL.to_string());

            let target = req
                .uri()
                .path_and_query()
                .map(|pq| pq.as_str())
                .unwrap_or_else(|| req.path());

            AppError::Unauthorized {
                login_url: format!("{}?next={}", login_url, encode_next(target)),
            }
        }))
    }
}

/// Percent-encode a return path for the `next` parameter, keeping `/` readable
fn encode_next(target: &str) -> String {
    urlencoding::encode(target).replace("%2F", "/")
}

// =====================================================================
// Metrics middleware
// =====================================================================

pub struct MetricsMiddleware;

impl<S, B> Transform<S, ServiceRequest> for MetricsMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = MetricsMiddlewareService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(MetricsMiddlewareService {
            service: Rc::new(service),
        }))
    }
}

pub struct MetricsMiddlewareService<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for MetricsMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = self.service.clone();
        let path = req.path().to_string();
        let method = req.method().to_string();
        let start = Instant::now();

        Box::pin(async move {
            let res = service.call(req).await;
            let elapsed = start.elapsed().as_millis();
            let status = res.as_ref().map(|r| r.status().as_u16()).unwrap_or(500);
            let status_label = status.to_string();
            crate::metrics::HTTP_REQUESTS_TOTAL
                .with_label_values(&[method.as_str(), status_label.as_str()])
                .inc();
            tracing::debug!(%method, %path, status, %elapsed, "request completed");
            res
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{http::StatusCode, test, web, App, HttpResponse};
    use jsonwebtoken::{encode, EncodingKey, Header};

    const SECRET: &str = "unit-test-secret-that-is-long-enough-0001";

    fn token_for(sub: &str, secret: &str) -> String {
        let now = chrono::Utc::now().timestamp() as usize;
        let claims = Claims {
            sub: sub.to_string(),
            exp: now + 3600,
            iat: now,
        };
        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    async fn whoami(user: Option<UserId>) -> HttpResponse {
        match user {
            Some(UserId(id)) => HttpResponse::Ok().body(id.to_string()),
            None => HttpResponse::Ok().body("anonymous"),
        }
    }

    async fn private(user: UserId) -> HttpResponse {
        HttpResponse::Ok().body(user.0.to_string())
    }

    #[actix_web::test]
    async fn test_identity_resolution() {
        let app = test::init_service(
            App::new()
                .wrap(JwtAuthMiddleware::new(SECRET))
                .route("/whoami", web::get().to(whoami)),
        )
        .await;

        let cases = [
            (Some(format!("Bearer {}", token_for("42", SECRET))), "42"),
            (None, "anonymous"),
            (Some("Bearer not-a-jwt".to_string()), "anonymous"),
            (
                Some(format!("Bearer {}", token_for("42", "some-other-secret-long-enough-xx"))),
                "anonymous",
            ),
            (Some(format!("Bearer {}", token_for("alice", SECRET))), "anonymous"),
        ];

        for (header, expected) in cases {
            let mut req = test::TestRequest::get().uri("/whoami");
            if let Some(value) = header {
                req = req.insert_header(("Authorization", value));
            }
            let body = test::call_and_read_body(&app, req.to_request()).await;
            assert_eq!(body, expected);
        }
    }

    #[actix_web::test]
    async fn test_required_identity_redirects_to_login() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(Config::default()))
                .wrap(JwtAuthMiddleware::new(SECRET))
                .route("/private", web::get().to(private)),
        )
        .await;

        let req = test::TestRequest::get().uri("/private").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::FOUND);
        assert_eq!(
            resp.headers().get("Location").unwrap(),
            "/userprofile/login/?next=/private"
        );

        let req = test::TestRequest::get()
            .uri("/private?page=2&tag=rust%20web")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(
            resp.headers().get("Location").unwrap(),
            "/userprofile/login/?next=/private%3Fpage%3D2%26tag%3Drust%2520web"
        );
    }

    #[::core::prelude::v1::test]
    fn test_encode_next_keeps_slashes() {
        assert_eq!(encode_next("/article/article-create/"), "/article/article-create/");
        assert_eq!(encode_next("/a?x=1&y=2"), "/a%3Fx%3D1%26y%3D2");
    }
}
