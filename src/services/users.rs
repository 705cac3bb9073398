//! Registration, login and user management service

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    config::AdminConfig,
    error::{AppError, AppResult},
    models::user::{LoginRequest, NewUser, RegisterUser, Role, UpdateRole, User},
    repository::Repository,
};

use super::tokens::{TokenPair, TokenService};

const INVALID_CREDENTIALS: &str = "Invalid username or password";

#[derive(Clone)]
pub struct UsersService {
    repository: Repository,
    tokens: TokenService,
}

impl UsersService {
    pub fn new(repository: Repository, tokens: TokenService) -> Self {
        Self { repository, tokens }
    }

    /// Register a new regular user
    pub async fn register(&self, request: RegisterUser) -> AppResult<User> {
        request.validate()?;

        let username = request.username.trim().to_lowercase();
        if self
            .repository
            .users
            .username_or_phone_exists(&username, &request.phone_number)
            .await?
        {
            return Err(AppError::Conflict("User already exists".to_string()));
        }

        let password_hash = hash_password(request.password).await?;

        let user = self
            .repository
            .users
            .create(&NewUser {
                username,
                fullname: request.fullname,
                email: request.email,
                address: request.address,
                phone_number: request.phone_number,
                password_hash,
                role: Role::Regular,
            })
            .await
            .map_err(|e| match e {
                AppError::Conflict(_) => AppError::Conflict("User already exists".to_string()),
                other => other,
            })?;

        tracing::info!(user_id = %user.id, username = %user.username, "User registered");
        Ok(user)
    }

    /// Authenticate by username and password and issue a token pair
    pub async fn login(&self, request: LoginRequest) -> AppResult<TokenPair> {
        request.validate()?;

        let username = request.username.trim().to_lowercase();
        let user = self
            .repository
            .users
            .get_by_username(&username)
            .await?
            .ok_or_else(|| AppError::Authentication(INVALID_CREDENTIALS.to_string()))?;

        if !verify_password(user.password.clone(), request.password).await? {
            tracing::debug!(username = %username, "Rejected login with wrong password");
            return Err(AppError::Authentication(INVALID_CREDENTIALS.to_string()));
        }

        self.tokens.issue(&user)
    }

    /// All users, newest first
    pub async fn list_users(&self) -> AppResult<Vec<User>> {
        self.repository.users.list().await
    }

    /// Set a user's role (admin only, enforced by the caller)
    pub async fn update_role(&self, request: UpdateRole) -> AppResult<User> {
        let (user_id, role) = match (request.user_id, request.role) {
            (Some(user_id), Some(role)) if !user_id.trim().is_empty() && !role.trim().is_empty() => {
                (user_id, role)
            }
            _ => return Err(AppError::Validation("User ID and role are required".to_string())),
        };

        let role: Role = role
            .parse()
            .map_err(|_| AppError::Validation("Role must be either 'admin' or 'regular'".to_string()))?;
        let user_id = Uuid::parse_str(user_id.trim())
            .map_err(|_| AppError::Validation("Invalid user ID".to_string()))?;

        let user = self
            .repository
            .users
            .update_role(user_id, role)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        tracing::info!(user_id = %user.id, role = %user.role, "User role updated");
        Ok(user)
    }

    /// Create the configured administrator if no user holds that username yet
    pub async fn ensure_admin(&self, admin: &AdminConfig) -> AppResult<()> {
        let username = admin.username.trim().to_lowercase();
        if username.is_empty() || admin.password.is_empty() {
            return Err(AppError::Validation("Admin username and password must not be empty".to_string()));
        }

        if self.repository.users.get_by_username(&username).await?.is_some() {
            tracing::debug!(username = %username, "Administrator already present");
            return Ok(());
        }

        let password_hash = hash_password(admin.password.clone()).await?;
        let user = self
            .repository
            .users
            .create(&NewUser {
                username,
                fullname: admin.fullname.clone(),
                email: admin.email.clone(),
                address: admin.address.clone(),
                phone_number: admin.phone_number.clone(),
                password_hash,
                role: Role::Admin,
            })
            .await?;

        tracing::info!(user_id = %user.id, username = %user.username, "Administrator account created");
        Ok(())
    }
}

/// Hash a password using Argon2 on the blocking pool
async fn hash_password(password: String) -> AppResult<String> {
    tokio::task::spawn_blocking(move || {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))
    })
    .await
    .map_err(|e| AppError::Internal(format!("Hashing task failed: {}", e)))?
}

/// Verify a password against a stored Argon2 hash on the blocking pool
async fn verify_password(hash: String, password: String) -> AppResult<bool> {
    tokio::task::spawn_blocking(move || -> AppResult<bool> {
        let parsed_hash = PasswordHash::new(&hash)
            .map_err(|_| AppError::Internal("Invalid password hash".to_string()))?;
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok())
    })
    .await
    .map_err(|e| AppError::Internal(format!("Verification task failed: {}", e)))?
}
