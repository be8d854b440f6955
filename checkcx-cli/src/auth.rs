//! Session tokens and the authentication middleware
//!
//! Provides:
//! - Password hashing (argon2)
//! - JWT issue and validation
//! - Bearer token middleware for protected routes

use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

use crate::config::AuthSettings;
use crate::AppState;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("password hashing failed: {0}")]
    Hash(String),

    #[error("token error: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),

    #[error("system clock is before the unix epoch")]
    Clock,
}

// =============================================================================
// JWT Claims
// =============================================================================

/// JWT token claims
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,
    pub email: Option<String>,
    /// Expiration time (Unix timestamp)
    pub exp: usize,
    /// Issued at (Unix timestamp)
    pub iat: usize,
}

/// Authenticated user info (available in request extensions)
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user_id: String,
    pub email: Option<String>,
    pub expires_at: usize,
}

// =============================================================================
// Passwords
// =============================================================================

/// Hash a password using Argon2
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AuthError::Hash(e.to_string()))
}

/// Verify a password against a hash
pub fn verify_password(password: &str, hash: &str) -> bool {
    let parsed_hash = match PasswordHash::new(hash) {
        Ok(hash) => hash,
        Err(_) => return false,
    };

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}

// =============================================================================
// Tokens
// =============================================================================

fn unix_now() -> Result<usize, AuthError> {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs() as usize)
        .map_err(|_| AuthError::Clock)
}

/// Generate a JWT token for a user
pub fn generate_jwt(
    settings: &AuthSettings,
    user_id: &str,
    email: Option<&str>,
) -> Result<String, AuthError> {
    let now = unix_now()?;

    let claims = Claims {
        sub: user_id.to_string(),
        email: email.map(str::to_string),
        exp: now + settings.token_ttl_hours as usize * 60 * 60,
        iat: now,
    };

    Ok(encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(settings.jwt_secret.as_bytes()),
    )?)
}

/// Decode and validate JWT token
pub fn decode_token(settings: &AuthSettings, token: &str) -> Result<Claims, AuthError> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(settings.jwt_secret.as_bytes()),
        &Validation::default(),
    )?;

    Ok(token_data.claims)
}

/// Extract bearer token from request
fn extract_token(request: &Request) -> Option<&str> {
    request
        .headers()
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

// =============================================================================
// Authentication Middleware
// =============================================================================

/// Authentication middleware - extracts and validates JWT token
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Response {
    let token = match extract_token(&request) {
        Some(token) => token,
        None => {
            return (StatusCode::UNAUTHORIZED, Json(serde_json::json!({
                "error": "Unauthorized: missing bearer token"
            }))).into_response();
        }
    };

    let claims = match decode_token(&state.auth, token) {
        Ok(claims) => claims,
        Err(e) => {
            debug!("Token validation failed: {}", e);
            return (StatusCode::UNAUTHORIZED, Json(serde_json::json!({
                "error": "Unauthorized: invalid or expired token"
            }))).into_response();
        }
    };

    request.extensions_mut().insert(AuthenticatedUser {
        user_id: claims.sub,
        email: claims.email,
        expires_at: claims.exp,
    });

    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_roundtrip() {
        let hash = hash_password("correct horse battery").unwrap();
        assert!(verify_password("correct horse battery", &hash));
        assert!(!verify_password("wrong", &hash));
        assert!(!verify_password("anything", "not-a-hash"));
    }

    #[test]
    fn test_password_hashes_are_salted() {
        let first = hash_password("same password").unwrap();
        let second = hash_password("same password").unwrap();
        assert_ne!(first, second);
        assert!(first.starts_with("$argon2"));
        assert!(verify_password("same password", &second));
    }

    #[test]
    fn test_token_claims() {
        let settings = AuthSettings::development();
        let token = generate_jwt(&settings, "user-1", Some("admin@example.com")).unwrap();

        let claims = decode_token(&settings, &token).unwrap();
        assert_eq!(claims.sub, "user-1");
        assert_eq!(claims.email.as_deref(), Some("admin@example.com"));
        assert_eq!(claims.exp - claims.iat, 24 * 60 * 60);
    }

    #[test]
    fn test_token_rejected_with_other_secret() {
        let token = generate_jwt(&AuthSettings::development(), "user-1", None).unwrap();
        let other = AuthSettings {
            jwt_secret: "another-secret".to_string(),
            token_ttl_hours: 24,
        };
        assert!(decode_token(&other, &token).is_err());
    }
}
