//! Authentication service.
//!
//! There is a single privileged account whose name and bcrypt hash come from
//! configuration. A successful login yields a short-lived HS256 access token.

use std::sync::Arc;

use bcrypt::{hash, verify, DEFAULT_COST};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, TokenData, Validation};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::config::Config;
use crate::error::{AppError, Result};

const ACCESS_TOKEN_TYPE: &str = "access";

/// JWT claims structure
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject (admin username)
    pub sub: String,
    pub is_admin: bool,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    pub token_type: String,
}

/// Issued token response
#[derive(Debug, Serialize, ToSchema)]
pub struct TokenPair {
    pub access_token: String,
    pub token_type: String,
    /// Lifetime in seconds
    pub expires_in: u64,
}

/// Authentication service
pub struct AuthService {
    config: Arc<Config>,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl AuthService {
    pub fn new(config: Arc<Config>) -> Self {
        let secret = config.jwt_secret.clone();
        Self {
            config,
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
        }
    }

    /// Check credentials against the configured admin account.
    pub fn authenticate(&self, username: &str, password: &str) -> Result<TokenPair> {
        let Some(password_hash) = self.config.admin_password_hash.as_deref() else {
            tracing::warn!("Admin login attempted but ADMIN_PASSWORD_HASH is not set");
            return Err(AppError::Authentication(
                "Admin login is disabled".to_string(),
            ));
        };

        // Always run bcrypt so a wrong username costs the same as a wrong password.
        let password_ok = Self::verify_password(password, password_hash)?;
        if username != self.config.admin_username || !password_ok {
            tracing::warn!(username, "Rejected admin login");
            return Err(AppError::Authentication(
                "Invalid username or password".to_string(),
            ));
        }

        tracing::info!(username, "Admin logged in");
        self.generate_token(username)
    }

    /// Generate an access token for the admin account
    pub fn generate_token(&self, username: &str) -> Result<TokenPair> {
        let now = Utc::now();
        let lifetime = Duration::minutes(self.config.jwt_access_token_expiry_minutes);

        let claims = Claims {
            sub: username.to_string(),
            is_admin: true,
            iat: now.timestamp(),
            exp: (now + lifetime).timestamp(),
            token_type: ACCESS_TOKEN_TYPE.to_string(),
        };

        let access_token = encode(&Header::default(), &claims, &self.encoding_key)?;

        Ok(TokenPair {
            access_token,
            token_type: "Bearer".to_string(),
            expires_in: lifetime.num_seconds().max(0) as u64,
        })
    }

    /// Validate an access token and return its claims
    pub fn validate_access_token(&self, token: &str) -> Result<Claims> {
        let token_data = self.decode_token(token)?;

        if token_data.claims.token_type != ACCESS_TOKEN_TYPE {
            return Err(AppError::Authentication("Invalid token type".to_string()));
        }

        Ok(token_data.claims)
    }

    fn decode_token(&self, token: &str) -> Result<TokenData<Claims>> {
        decode::<Claims>(token, &self.decoding_key, &Validation::default())
            .map_err(|e| AppError::Authentication(format!("Invalid token: {}", e)))
    }

    /// Hash a password
    pub fn hash_password(password: &str) -> Result<String> {
        hash(password, DEFAULT_COST)
            .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))
    }

    /// Verify a password against a hash
    pub fn verify_password(password: &str, hash: &str) -> Result<bool> {
        verify(password, hash)
            .map_err(|e| AppError::Internal(format!("Password verification failed: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(password_hash: Option<String>) -> Arc<Config> {
        Arc::new(Config {
            database_url: "postgres://localhost/cbm".into(),
            bind_address: "127.0.0.1:0".into(),
            db_max_connections: 1,
            store_timeout_secs: 1,
            overview_window_hours: 48,
            page_size: 25,
            jwt_secret: "test-secret-0123456789".into(),
            jwt_access_token_expiry_minutes: 30,
            admin_username: "admin".into(),
            admin_password_hash: password_hash,
            otel_endpoint: None,
        })
    }

    fn cheap_hash(password: &str) -> String {
        bcrypt::hash(password, 4).unwrap()
    }

    #[test]
    fn test_password_hashing() {
        let password = "secure_password_123";
        let hashed = AuthService::hash_password(password).unwrap();
        assert!(hashed.starts_with("$2"));
        assert!(AuthService::verify_password(password, &hashed).unwrap());
        assert!(!AuthService::verify_password("wrong_password", &hashed).unwrap());
    }

    #[test]
    fn test_login_issues_valid_token() {
        let service = AuthService::new(config(Some(cheap_hash("letmein"))));
        let tokens = service.authenticate("admin", "letmein").unwrap();
        assert_eq!(tokens.token_type, "Bearer");
        assert_eq!(tokens.expires_in, 30 * 60);

        let claims = service.validate_access_token(&tokens.access_token).unwrap();
        assert_eq!(claims.sub, "admin");
        assert!(claims.is_admin);
    }

    #[test]
    fn test_wrong_credentials_rejected() {
        let service = AuthService::new(config(Some(cheap_hash("letmein"))));
        assert!(matches!(
            service.authenticate("admin", "nope"),
            Err(AppError::Authentication(_))
        ));
        assert!(matches!(
            service.authenticate("root", "letmein"),
            Err(AppError::Authentication(_))
        ));
    }

    #[test]
    fn test_login_disabled_without_hash() {
        let service = AuthService::new(config(None));
        assert!(matches!(
            service.authenticate("admin", "anything"),
            Err(AppError::Authentication(_))
        ));
    }

    #[test]
    fn test_token_from_other_secret_rejected() {
        let service = AuthService::new(config(None));
        let mut other = (*config(None)).clone();
        other.jwt_secret = "another-secret-9876543210".into();
        let foreign = AuthService::new(Arc::new(other))
            .generate_token("admin")
            .unwrap();
        assert!(service.validate_access_token(&foreign.access_token).is_err());
    }
}
