//! HTTP client for the Libris API
//!
//! Keeps the tokens issued at login in a [`Session`] and attaches the access
//! token to every protected call. A 401 or 403 from the server ends the
//! session, the same way a browser front end would log the reader out.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
    api::{
        books::{BookResponse, BooksResponse, ReadBookResponse},
        users::{LoginResponse, MessageResponse, UpdateRoleResponse, UsersResponse},
    },
    models::{
        book::{CreateBook, DeleteBook, UpdateBook},
        user::{LoginRequest, RegisterUser, UpdateRole},
        Book, BookShort, Role, User,
    },
};

#[derive(Error, Debug)]
pub enum ClientError {
    /// The server refused the credentials; the session has been cleared
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("API error {status}: {message}")]
    Api { status: StatusCode, message: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Decode error: {0}")]
    Decode(String),
}

pub type ClientResult<T> = Result<T, ClientError>;

/// Tokens from the last login plus what the access token says about its holder
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub access: String,
    pub refresh: String,
    pub role: Role,
    pub username: String,
}

impl Session {
    /// Build a session by reading the access token payload.
    ///
    /// The signature is not checked here; the server does that on every call.
    pub fn from_tokens(access: String, refresh: String) -> ClientResult<Self> {
        let payload = access
            .split('.')
            .nth(1)
            .ok_or_else(|| ClientError::Decode("Access token has no payload".to_string()))?;
        let bytes = URL_SAFE_NO_PAD
            .decode(payload.trim_end_matches('='))
            .map_err(|e| ClientError::Decode(e.to_string()))?;
        let claims: Value =
            serde_json::from_slice(&bytes).map_err(|e| ClientError::Decode(e.to_string()))?;

        let role = claims
            .get("role")
            .and_then(Value::as_str)
            .and_then(|r| r.parse().ok())
            .unwrap_or_default();
        let username = claims
            .get("username")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        Ok(Self {
            access,
            refresh,
            role,
            username,
        })
    }
}

pub struct LibraryClient {
    base_url: String,
    client: reqwest::Client,
    session: RwLock<Option<Session>>,
}

impl LibraryClient {
    /// `base_url` is the API root, e.g. `http://localhost:8080/api/v1`
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
            session: RwLock::new(None),
        }
    }

    pub async fn session(&self) -> Option<Session> {
        self.session.read().await.clone()
    }

    pub async fn is_authenticated(&self) -> bool {
        self.session.read().await.is_some()
    }

    pub async fn is_admin(&self) -> bool {
        self.session
            .read()
            .await
            .as_ref()
            .is_some_and(|s| s.role.is_admin())
    }

    pub async fn logout(&self) {
        if let Some(session) = self.session.write().await.take() {
            tracing::debug!(username = %session.username, "Session cleared");
        }
    }

    pub async fn register(&self, user: &RegisterUser) -> ClientResult<String> {
        let request = self.request(Method::POST, "/user/register-user").json(user);
        let response: MessageResponse = self.send(request).await?;
        Ok(response.message)
    }

    /// Log in and keep the issued tokens as the current session
    pub async fn login(&self, username: &str, password: &str) -> ClientResult<Session> {
        let body = LoginRequest {
            username: username.to_string(),
            password: password.to_string(),
        };
        let request = self.request(Method::POST, "/user/login-user").json(&body);
        let response: LoginResponse = self.send(request).await?;

        let session = Session::from_tokens(response.access, response.refresh)?;
        *self.session.write().await = Some(session.clone());
        Ok(session)
    }

    pub async fn read_book(&self, book_id: &str) -> ClientResult<Book> {
        let request = self
            .authorized(Method::GET, "/user/library-main/read-book")
            .await
            .query(&[("bookId", book_id)]);
        let response: ReadBookResponse = self.send(request).await?;
        Ok(response.is_book)
    }

    pub async fn list_books(&self) -> ClientResult<Vec<BookShort>> {
        let request = self
            .authorized(Method::GET, "/user/library-main/get-all-books")
            .await;
        let response: BooksResponse = self.send(request).await?;
        Ok(response.books)
    }

    pub async fn add_book(&self, book: &CreateBook) -> ClientResult<Book> {
        let request = self
            .authorized(Method::POST, "/user/library-main/add-book")
            .await
            .json(book);
        let response: BookResponse = self.send(request).await?;
        Ok(response.book)
    }

    /// Append `updation` to the content of the book
    pub async fn update_book(&self, book_id: &str, updation: &str) -> ClientResult<Book> {
        let body = UpdateBook {
            book_id: book_id.to_string(),
            updation: updation.to_string(),
        };
        let request = self
            .authorized(Method::PUT, "/user/library-main/update-book")
            .await
            .json(&body);
        let response: BookResponse = self.send(request).await?;
        Ok(response.book)
    }

    pub async fn delete_book(&self, book_id: &str, title: Option<&str>) -> ClientResult<String> {
        let body = DeleteBook {
            title: title.map(str::to_string),
            book_id: book_id.to_string(),
        };
        let request = self
            .authorized(Method::DELETE, "/user/library-main/delete-book")
            .await
            .json(&body);
        let response: MessageResponse = self.send(request).await?;
        Ok(response.message)
    }

    pub async fn list_users(&self) -> ClientResult<Vec<User>> {
        let request = self.authorized(Method::GET, "/user/users/get-all-users").await;
        let response: UsersResponse = self.send(request).await?;
        Ok(response.users)
    }

    pub async fn update_role(&self, user_id: Uuid, role: Role) -> ClientResult<UpdateRoleResponse> {
        let body = UpdateRole {
            user_id: Some(user_id.to_string()),
            role: Some(role.to_string()),
        };
        let request = self
            .authorized(Method::PUT, "/user/users/update-role")
            .await
            .json(&body);
        self.send(request).await
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.client.request(method, format!("{}{}", self.base_url, path))
    }

    /// Request carrying the session's access token, when there is one
    async fn authorized(&self, method: Method, path: &str) -> RequestBuilder {
        let request = self.request(method, path);
        match self.session.read().await.as_ref() {
            Some(session) => request.bearer_auth(&session.access),
            None => request,
        }
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> ClientResult<T> {
        let response = request.send().await?;
        let status = response.status();

        if status.is_success() {
            return response
                .json::<T>()
                .await
                .map_err(|e| ClientError::Decode(e.to_string()));
        }

        let message = response
            .json::<Value>()
            .await
            .ok()
            .and_then(|body| body.get("message").and_then(Value::as_str).map(str::to_string))
            .unwrap_or_else(|| status.to_string());

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            self.logout().await;
            return Err(ClientError::Unauthorized(message));
        }

        Err(ClientError::Api { status, message })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token_with(payload: &str) -> String {
        format!("e30.{}.sig", URL_SAFE_NO_PAD.encode(payload))
    }

    #[test]
    fn test_session_reads_role_and_username() {
        let access = token_with(r#"{"username":"alice","role":"admin"}"#);
        let session = Session::from_tokens(access, "r".to_string()).unwrap();

        assert_eq!(session.username, "alice");
        assert_eq!(session.role, Role::Admin);
    }

    #[test]
    fn test_session_role_defaults_to_regular() {
        let access = token_with(r#"{"username":"bob"}"#);
        let session = Session::from_tokens(access, "r".to_string()).unwrap();
        assert_eq!(session.role, Role::Regular);

        let access = token_with(r#"{"username":"bob","role":"owner"}"#);
        let session = Session::from_tokens(access, "r".to_string()).unwrap();
        assert_eq!(session.role, Role::Regular);
    }

    #[test]
    fn test_session_rejects_malformed_token() {
        assert!(matches!(
            Session::from_tokens("opaque".to_string(), String::new()),
            Err(ClientError::Decode(_))
        ));
        assert!(matches!(
            Session::from_tokens("a.!!!.c".to_string(), String::new()),
            Err(ClientError::Decode(_))
        ));
    }

    #[tokio::test]
    async fn test_new_client_is_logged_out() {
        let client = LibraryClient::new("http://localhost:8080/api/v1/");
        assert!(!client.is_authenticated().await);
        assert!(!client.is_admin().await);
        assert!(client.session().await.is_none());
    }
}
