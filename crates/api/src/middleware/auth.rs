//! JWT authentication middleware and helpers.
//!
//! Provides JWT encoding/decoding plus the `AuthUser` and `AdminUser` Axum
//! extractors. The token subject is the caller's ledger account.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use ledger_common::error::AppError;
use ledger_common::types::AccountId;

use crate::state::AppState;

/// JWT claims stored in the token.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject: the account the bearer acts as
    pub sub: String,
    /// Expiration time (UNIX timestamp)
    pub exp: i64,
    /// Issued at (UNIX timestamp)
    pub iat: i64,
}

/// Caller authenticated by a bearer token.
///
/// ```ignore
/// async fn handler(auth: AuthUser) -> impl IntoResponse {
///     // auth.account is the caller's ledger account
/// }
/// ```
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub account: AccountId,
    pub claims: Claims,
}

/// Caller authenticated as the configured admin account.
#[derive(Debug, Clone)]
pub struct AdminUser(pub AuthUser);

/// Encode a JWT token for an account.
pub fn encode_jwt(account: &AccountId, secret: &str, expiry_hours: u64) -> Result<String, AppError> {
    let now = Utc::now();
    let exp = now + Duration::hours(expiry_hours as i64);

    let claims = Claims {
        sub: account.to_string(),
        exp: exp.timestamp(),
        iat: now.timestamp(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::Auth(format!("Failed to encode JWT: {}", e)))
}

/// Decode and validate a JWT token.
pub fn decode_jwt(token: &str, secret: &str) -> Result<Claims, AppError> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|e| AppError::Auth(format!("Invalid token: {}", e)))?;

    Ok(token_data.claims)
}

/// Extracts and validates the JWT from the `Authorization: Bearer <token>` header.
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> impl std::future::Future<Output = Result<Self, Self::Rejection>> + Send {
        let secret = state.config.jwt_secret.clone();

        let auth_header = parts
            .headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());

        async move {
            let token = auth_header
                .as_deref()
                .and_then(|auth| auth.strip_prefix("Bearer "))
                .ok_or_else(|| {
                    AppError::Auth(
                        "Missing or invalid Authorization header. Use 'Bearer <JWT>'".to_string(),
                    )
                })?;

            let claims = decode_jwt(token, &secret)?;
            if claims.sub.trim().is_empty() {
                return Err(AppError::Auth("Empty account in token".to_string()));
            }

            Ok(AuthUser {
                account: AccountId::new(claims.sub.clone()),
                claims,
            })
        }
    }
}

impl FromRequestParts<AppState> for AdminUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        match &state.config.admin_account {
            Some(admin) if *admin == user.account => Ok(AdminUser(user)),
            _ => {
                tracing::warn!(account = %user.account, "Admin route rejected");
                Err(AppError::Forbidden("Admin account required".to_string()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_SECRET: &str = "test-secret-key-for-unit-tests";

    #[test]
    fn test_encode_decode_jwt() {
        let account = AccountId::new("alice");
        let token = encode_jwt(&account, TEST_SECRET, 24).unwrap();
        let claims = decode_jwt(&token, TEST_SECRET).unwrap();
        assert_eq!(claims.sub, "alice");
        assert!(claims.exp > Utc::now().timestamp());
    }

    #[test]
    fn test_invalid_secret_rejected() {
        let token = encode_jwt(&AccountId::new("alice"), TEST_SECRET, 24).unwrap();
        assert!(decode_jwt(&token, "wrong-secret").is_err());
    }

    #[test]
    fn test_expired_jwt_rejected() {
        // Expired an hour ago, well past the default leeway
        let now = Utc::now();
        let claims = Claims {
            sub: "alice".to_string(),
            exp: (now - Duration::hours(1)).timestamp(),
            iat: (now - Duration::hours(2)).timestamp(),
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(TEST_SECRET.as_bytes()),
        )
        .unwrap();

        assert!(decode_jwt(&token, TEST_SECRET).is_err());
    }

    #[test]
    fn test_garbage_token_rejected() {
        assert!(decode_jwt("not.a.valid.jwt", TEST_SECRET).is_err());
    }
}
