//! JWT validation.
//!
//! Token issuance is an external collaborator's job; this side only
//! validates bearer tokens and reads the subject and tier claims.

use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

use super::AuthError;

/// Claims carried by an access token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user identifier).
    pub sub: String,
    /// Subscription tier; absent reads as free.
    #[serde(default)]
    pub tier: Option<String>,
    /// Expiry (unix seconds).
    pub exp: i64,
    /// Issued-at (unix seconds).
    #[serde(default)]
    pub iat: i64,
}

/// Validates an access token and returns its claims.
pub fn validate_access_token(token: &str, secret: &str) -> Result<Claims, AuthError> {
    let validation = Validation::default();
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::ExpiredToken,
        _ => AuthError::InvalidToken,
    })
}

#[cfg(test)]
mod tests {
    use jsonwebtoken::{encode, EncodingKey, Header};

    use super::*;

    fn token_with(claims: &Claims, secret: &str) -> String {
        encode(
            &Header::default(),
            claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    #[test]
    fn test_valid_token_roundtrip() {
        let claims = Claims {
            sub: "user-1".to_string(),
            tier: Some("pro".to_string()),
            exp: chrono::Utc::now().timestamp() + 900,
            iat: chrono::Utc::now().timestamp(),
        };
        let token = token_with(&claims, "secret");

        let decoded = validate_access_token(&token, "secret").unwrap();
        assert_eq!(decoded.sub, "user-1");
        assert_eq!(decoded.tier.as_deref(), Some("pro"));
    }

    #[test]
    fn test_expired_token_rejected() {
        let claims = Claims {
            sub: "user-1".to_string(),
            tier: None,
            exp: chrono::Utc::now().timestamp() - 3600,
            iat: 0,
        };
        let token = token_with(&claims, "secret");
        assert!(matches!(
            validate_access_token(&token, "secret"),
            Err(AuthError::ExpiredToken)
        ));
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let claims = Claims {
            sub: "user-1".to_string(),
            tier: None,
            exp: chrono::Utc::now().timestamp() + 900,
            iat: 0,
        };
        let token = token_with(&claims, "secret");
        assert!(matches!(
            validate_access_token(&token, "other"),
            Err(AuthError::InvalidToken)
        ));
    }
}
