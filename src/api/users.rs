//! Registration, login and user administration endpoints

use axum::{extract::State, Json};
use axum_extra::extract::WithRejection;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    error::{AppError, AppResult},
    models::user::{LoginRequest, RegisterUser, UpdateRole, User, UserSummary},
    AppState,
};

use super::AdminUser;

/// Plain acknowledgement body
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LoginResponse {
    pub message: String,
    /// Access token
    pub access: String,
    /// Refresh token
    pub refresh: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UsersResponse {
    pub users: Vec<User>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UpdateRoleResponse {
    pub message: String,
    pub user: UserSummary,
}

/// Register a new user (always with the regular role)
#[utoipa::path(
    post,
    path = "/user/register-user",
    tag = "auth",
    request_body = RegisterUser,
    responses(
        (status = 200, description = "User registered", body = MessageResponse),
        (status = 400, description = "Missing or invalid fields", body = crate::error::ErrorResponse),
        (status = 409, description = "Username or phone number already used", body = crate::error::ErrorResponse)
    )
)]
pub async fn register_user(
    State(state): State<AppState>,
    WithRejection(Json(request), _): WithRejection<Json<RegisterUser>, AppError>,
) -> AppResult<Json<MessageResponse>> {
    state.services.users.register(request).await?;

    Ok(Json(MessageResponse {
        message: "User Registration Successful".to_string(),
    }))
}

/// Login with username and password
#[utoipa::path(
    post,
    path = "/user/login-user",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = LoginResponse),
        (status = 400, description = "Missing credentials", body = crate::error::ErrorResponse),
        (status = 401, description = "Invalid username or password", body = crate::error::ErrorResponse)
    )
)]
pub async fn login_user(
    State(state): State<AppState>,
    WithRejection(Json(request), _): WithRejection<Json<LoginRequest>, AppError>,
) -> AppResult<Json<LoginResponse>> {
    let tokens = state.services.users.login(request).await?;

    Ok(Json(LoginResponse {
        message: "Login successful".to_string(),
        access: tokens.access,
        refresh: tokens.refresh,
    }))
}

/// List all users, newest first (admin only)
#[utoipa::path(
    get,
    path = "/user/users/get-all-users",
    tag = "users",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "All users", body = UsersResponse),
        (status = 401, description = "Not authenticated", body = crate::error::ErrorResponse),
        (status = 403, description = "Admin privileges required", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_all_users(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
) -> AppResult<Json<UsersResponse>> {
    let users = state.services.users.list_users().await?;
    Ok(Json(UsersResponse { users }))
}

/// Set a user's role to admin or regular (admin only)
#[utoipa::path(
    put,
    path = "/user/users/update-role",
    tag = "users",
    security(("bearer_auth" = [])),
    request_body = UpdateRole,
    responses(
        (status = 200, description = "Role updated", body = UpdateRoleResponse),
        (status = 400, description = "Missing user ID or invalid role", body = crate::error::ErrorResponse),
        (status = 403, description = "Admin privileges required", body = crate::error::ErrorResponse),
        (status = 404, description = "User not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn update_role(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    WithRejection(Json(request), _): WithRejection<Json<UpdateRole>, AppError>,
) -> AppResult<Json<UpdateRoleResponse>> {
    let user = state.services.users.update_role(request).await?;
    tracing::info!(admin = %admin.username, target = %user.username, "Role change applied");

    Ok(Json(UpdateRoleResponse {
        message: "User role updated successfully".to_string(),
        user: user.into(),
    }))
}

#[cfg(test)]
mod tests {
    use super::super::test_support::TestApp;
    use crate::models::user::Role;
    use axum::http::StatusCode;
    use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
    use serde_json::{json, Value};

    fn alice() -> Value {
        json!({
            "username": "alice",
            "fullname": "Alice Liddell",
            "email": "alice@example.com",
            "address": "1 Rabbit Hole",
            "phoneNumber": "555",
            "password": "secret1",
            "role": "admin"
        })
    }

    fn decode_claims(token: &str) -> Value {
        let payload = token.split('.').nth(1).unwrap();
        serde_json::from_slice(&URL_SAFE_NO_PAD.decode(payload).unwrap()).unwrap()
    }

    #[tokio::test]
    async fn test_register_login_then_forbidden_add_book() {
        let app = TestApp::new();

        let (status, body) = app
            .send("POST", "/api/v1/user/register-user", None, Some(alice()))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "User Registration Successful");
        assert!(body.get("password").is_none());

        let (status, body) = app
            .send(
                "POST",
                "/api/v1/user/login-user",
                None,
                Some(json!({ "username": "alice", "password": "secret1" })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        let access = body["access"].as_str().unwrap().to_string();
        assert!(body["refresh"].is_string());
        assert_eq!(decode_claims(&access)["role"], "regular");
        assert_eq!(decode_claims(&access)["phoneNumber"], "555");

        let (status, _) = app
            .send(
                "POST",
                "/api/v1/user/library-main/add-book",
                Some(&access),
                Some(json!({
                    "title": "Dune",
                    "bookId": "B-1",
                    "section": "fiction",
                    "author": "Frank Herbert",
                    "content": "...",
                    "edition": 1
                })),
            )
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_duplicate_registration_conflicts() {
        let app = TestApp::new();
        app.send("POST", "/api/v1/user/register-user", None, Some(alice())).await;

        let mut again = alice();
        again["username"] = json!("alice2");
        let (status, body) = app
            .send("POST", "/api/v1/user/register-user", None, Some(again))
            .await;

        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["message"], "User already exists");
        assert_eq!(body["error"], "Conflict");
    }

    #[tokio::test]
    async fn test_register_missing_fields_is_bad_request() {
        let app = TestApp::new();
        let (status, body) = app
            .send(
                "POST",
                "/api/v1/user/register-user",
                None,
                Some(json!({ "username": "bob" })),
            )
            .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "ValidationError");
    }

    #[tokio::test]
    async fn test_malformed_json_is_bad_request() {
        let app = TestApp::new();
        let request = axum::http::Request::builder()
            .method("POST")
            .uri("/api/v1/user/login-user")
            .header("Content-Type", "application/json")
            .body(axum::body::Body::from("{not json"))
            .unwrap();
        let response = tower::ServiceExt::oneshot(app.router.clone(), request).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_login_failures_are_indistinguishable() {
        let app = TestApp::new();
        app.send("POST", "/api/v1/user/register-user", None, Some(alice())).await;

        let (s1, b1) = app
            .send(
                "POST",
                "/api/v1/user/login-user",
                None,
                Some(json!({ "username": "ghost", "password": "secret1" })),
            )
            .await;
        let (s2, b2) = app
            .send(
                "POST",
                "/api/v1/user/login-user",
                None,
                Some(json!({ "username": "alice", "password": "wrong" })),
            )
            .await;

        assert_eq!(s1, StatusCode::UNAUTHORIZED);
        assert_eq!(s2, StatusCode::UNAUTHORIZED);
        assert_eq!(b1, b2);
    }

    #[tokio::test]
    async fn test_admin_promotes_user() {
        let app = TestApp::new();
        let admin = app.token_for("root", Role::Admin).await;
        app.send("POST", "/api/v1/user/register-user", None, Some(alice())).await;

        let (status, body) = app
            .send("GET", "/api/v1/user/users/get-all-users", Some(&admin), None)
            .await;
        assert_eq!(status, StatusCode::OK);
        let users = body["users"].as_array().unwrap();
        assert_eq!(users.len(), 2);
        assert!(users.iter().all(|u| u.get("password").is_none()));
        let alice = users.iter().find(|u| u["username"] == "alice").unwrap();
        assert_eq!(alice["role"], "regular");
        let alice_id = alice["id"].as_str().unwrap().to_string();

        let (status, body) = app
            .send(
                "PUT",
                "/api/v1/user/users/update-role",
                Some(&admin),
                Some(json!({ "userId": alice_id, "role": "admin" })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["user"]["role"], "admin");
        assert_eq!(body["user"]["username"], "alice");
    }

    #[tokio::test]
    async fn test_update_role_rejects_unknown_role_and_user() {
        let app = TestApp::new();
        let admin = app.token_for("root", Role::Admin).await;

        let (status, _) = app
            .send(
                "PUT",
                "/api/v1/user/users/update-role",
                Some(&admin),
                Some(json!({ "userId": uuid::Uuid::new_v4(), "role": "owner" })),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = app
            .send(
                "PUT",
                "/api/v1/user/users/update-role",
                Some(&admin),
                Some(json!({ "userId": uuid::Uuid::new_v4(), "role": "admin" })),
            )
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
