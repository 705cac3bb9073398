//! API handlers for Libris REST endpoints

pub mod books;
pub mod health;
pub mod openapi;
pub mod users;

use axum::{
    async_trait,
    extract::{DefaultBodyLimit, FromRequestParts},
    http::{header, header::AUTHORIZATION, request::Parts, Method},
    routing::{delete, get, post, put},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{error::AppError, models::user::Principal, AppState};

/// Maximum accepted request body size
const BODY_LIMIT_BYTES: usize = 10 * 1024;

/// Extractor for a principal holding a valid access token
pub struct AuthenticatedUser(pub Principal);

#[async_trait]
impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        // "<scheme> <token>": only the second segment is the credential
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.split_whitespace().nth(1))
            .ok_or_else(|| AppError::Authentication("No token provided".to_string()))?;

        let principal = state.services.tokens.verify_access(token)?;

        Ok(AuthenticatedUser(principal))
    }
}

/// Extractor for an authenticated principal with the admin role
pub struct AdminUser(pub Principal);

#[async_trait]
impl FromRequestParts<AppState> for AdminUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let AuthenticatedUser(principal) = AuthenticatedUser::from_request_parts(parts, state).await?;

        if let Err(e) = principal.require_admin() {
            tracing::warn!(user_id = %principal.id, path = %parts.uri.path(), "Admin route refused");
            return Err(e);
        }

        Ok(AdminUser(principal))
    }
}

/// Build the application router with all routes
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    let user_routes = Router::new()
        // Authentication
        .route("/register-user", post(users::register_user))
        .route("/login-user", post(users::login_user))
        // Library
        .route("/library-main/read-book", get(books::read_book))
        .route("/library-main/get-all-books", get(books::get_all_books))
        .route("/library-main/add-book", post(books::add_book))
        .route("/library-main/update-book", put(books::update_book))
        .route("/library-main/delete-book", delete(books::delete_book))
        // User administration
        .route("/users/get-all-users", get(users::get_all_users))
        .route("/users/update-role", put(users::update_role));

    let api_v1 = Router::new()
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        .nest("/user", user_routes)
        .with_state(state);

    Router::new()
        .route("/", get(health::welcome))
        .nest("/api/v1", api_v1)
        .merge(openapi::create_openapi_router())
        .layer(DefaultBodyLimit::max(BODY_LIMIT_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
