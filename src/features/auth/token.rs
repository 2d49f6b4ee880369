use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

use crate::core::config::AuthConfig;
use crate::core::error::AppError;
use crate::features::auth::model::AuthenticatedUser;

/// Claims carried by the identity service's HS256 tokens
#[derive(Debug, Serialize, Deserialize)]
pub struct TokenClaims {
    pub user_id: String,
    pub email: String,
    pub exp: u64,
    #[serde(default)]
    pub iat: Option<u64>,
}

/// Verifies HS256 bearer tokens issued by the identity service
pub struct TokenVerifier {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl TokenVerifier {
    pub fn new(config: &AuthConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = config.jwt_leeway.as_secs();

        Self {
            decoding_key: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            validation,
        }
    }

    pub fn verify(&self, token: &str) -> Result<AuthenticatedUser, AppError> {
        let data = decode::<TokenClaims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| {
                tracing::debug!("Token verification failed: {}", e);
                AppError::Unauthorized("Invalid token".to_string())
            })?;

        Ok(AuthenticatedUser {
            user_id: data.claims.user_id,
            email: data.claims.email,
        })
    }
}
