//! Access and refresh token issuance and verification

use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::{
    config::AuthConfig,
    error::{AppError, AppResult},
    models::user::{Principal, User},
};

/// Token pair returned on successful login
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

#[derive(Clone)]
struct Signer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl_seconds: i64,
}

impl Signer {
    fn new(secret: &str, ttl_seconds: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl_seconds,
        }
    }

    fn sign(&self, user: &User, now: i64) -> AppResult<String> {
        let claims = Principal {
            id: user.id,
            username: user.username.clone(),
            role: user.role,
            fullname: user.fullname.clone(),
            email: user.email.clone(),
            address: user.address.clone(),
            phone_number: user.phone_number.clone(),
            iat: now,
            exp: now + self.ttl_seconds,
        };

        encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| AppError::Internal(format!("Failed to create token: {}", e)))
    }

    fn verify(&self, token: &str, validation: &Validation) -> AppResult<Principal> {
        decode::<Principal>(token, &self.decoding, validation)
            .map(|data| data.claims)
            .map_err(|e| {
                tracing::debug!("Token rejected: {}", e);
                AppError::Authentication("Invalid or expired token".to_string())
            })
    }
}

/// Signs and verifies HS256 tokens; access and refresh tokens use distinct secrets
#[derive(Clone)]
pub struct TokenService {
    access: Signer,
    refresh: Signer,
    validation: Validation,
}

impl TokenService {
    pub fn new(config: &AuthConfig) -> Self {
        let mut validation = Validation::default();
        validation.leeway = 0;
        validation.validate_exp = true;

        Self {
            access: Signer::new(&config.access_secret, config.access_expiration_minutes as i64 * 60),
            refresh: Signer::new(&config.refresh_secret, config.refresh_expiration_hours as i64 * 3600),
            validation,
        }
    }

    /// Issue an access/refresh pair embedding the user's identity and role
    pub fn issue(&self, user: &User) -> AppResult<TokenPair> {
        let now = Utc::now().timestamp();
        Ok(TokenPair {
            access: self.access.sign(user, now)?,
            refresh: self.refresh.sign(user, now)?,
        })
    }

    pub fn verify_access(&self, token: &str) -> AppResult<Principal> {
        self.access.verify(token, &self.validation)
    }

    pub fn verify_refresh(&self, token: &str) -> AppResult<Principal> {
        self.refresh.verify(token, &self.validation)
    }
}
