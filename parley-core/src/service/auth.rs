use jsonwebtoken::{decode, Algorithm, DecodingKey, TokenData, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::{
    models::{User, UserId},
    Error, Result,
};

/// Identity claims carried by the bearer token presented at handshake.
/// Issued by the web front-end with the shared symmetric secret.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User ID
    pub sub: String,
    pub email: String,
    pub name: String,
    /// Avatar URL
    #[serde(skip_serializing_if = "Option::is_none")]
    pub picture: Option<String>,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

impl Claims {
    #[must_use]
    pub fn user_id(&self) -> UserId {
        UserId::from_string(self.sub.clone())
    }

    /// Snapshot of the identity for the users table upsert.
    #[must_use]
    pub fn to_user(&self) -> User {
        User::new(
            self.user_id(),
            self.name.clone(),
            self.email.clone(),
            self.picture.clone(),
        )
    }
}

/// Verifies bearer tokens on connection handshake.
#[derive(Clone)]
pub struct AuthVerifier {
    decoding_key: Arc<DecodingKey>,
    algorithm: Algorithm,
}

impl std::fmt::Debug for AuthVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthVerifier")
            .field("algorithm", &self.algorithm)
            .finish()
    }
}

impl AuthVerifier {
    /// Create a verifier from the HS256 secret shared with the front-end.
    /// An empty secret is a fatal misconfiguration, caught at boot.
    pub fn new(secret: &str) -> Result<Self> {
        if secret.is_empty() {
            return Err(Error::Internal(
                "Auth secret cannot be empty".to_string(),
            ));
        }

        Ok(Self {
            decoding_key: Arc::new(DecodingKey::from_secret(secret.as_bytes())),
            algorithm: Algorithm::HS256,
        })
    }

    /// Verify a token and extract identity claims. Runs once per
    /// connection, before any event is dispatched.
    pub fn verify(&self, token: &str) -> Result<Claims> {
        let mut validation = Validation::new(self.algorithm);
        validation.validate_exp = true;
        validation.validate_nbf = false;
        validation.leeway = 60; // 60 seconds leeway for clock skew
        validation.set_required_spec_claims(&["exp", "sub"]);

        let token_data: TokenData<Claims> = decode(token, &self.decoding_key, &validation)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
                    Error::Unauthenticated("Token expired".to_string())
                }
                jsonwebtoken::errors::ErrorKind::InvalidToken => {
                    Error::Unauthenticated("Invalid token".to_string())
                }
                jsonwebtoken::errors::ErrorKind::InvalidSignature => {
                    Error::Unauthenticated("Invalid token signature".to_string())
                }
                _ => Error::Unauthenticated(format!("Token verification failed: {e}")),
            })?;

        Ok(token_data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use jsonwebtoken::{encode, EncodingKey, Header};

    const SECRET: &str = "test-secret-key-shared-with-frontend";

    fn sign(claims: &Claims) -> String {
        encode(
            &Header::new(Algorithm::HS256),
            claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap()
    }

    fn claims_expiring_in(secs: i64) -> Claims {
        let now = Utc::now().timestamp();
        Claims {
            sub: "usr123456789".to_string(),
            email: "alice@example.com".to_string(),
            name: "Alice".to_string(),
            picture: Some("https://example.com/alice.png".to_string()),
            iat: now,
            exp: now + secs,
        }
    }

    #[test]
    fn test_verify_valid_token() {
        let verifier = AuthVerifier::new(SECRET).unwrap();
        let token = sign(&claims_expiring_in(3600));

        let claims = verifier.verify(&token).unwrap();
        assert_eq!(claims.sub, "usr123456789");
        assert_eq!(claims.email, "alice@example.com");
        assert_eq!(claims.user_id().as_str(), "usr123456789");

        let user = claims.to_user();
        assert_eq!(user.name, "Alice");
        assert!(user.avatar_url.is_some());
    }

    #[test]
    fn test_expired_token_rejected() {
        let verifier = AuthVerifier::new(SECRET).unwrap();
        // Beyond the 60s leeway
        let token = sign(&claims_expiring_in(-120));

        let err = verifier.verify(&token).unwrap_err();
        assert!(matches!(err, Error::Unauthenticated(_)));
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let verifier = AuthVerifier::new("a-different-secret").unwrap();
        let token = sign(&claims_expiring_in(3600));

        assert!(verifier.verify(&token).is_err());
    }

    #[test]
    fn test_tampered_token_rejected() {
        let verifier = AuthVerifier::new(SECRET).unwrap();
        let token = sign(&claims_expiring_in(3600));

        let mut parts: Vec<&str> = token.split('.').collect();
        parts[1] = "tampered_payload";
        let tampered = parts.join(".");

        assert!(verifier.verify(&tampered).is_err());
    }

    #[test]
    fn test_empty_secret_is_fatal() {
        assert!(AuthVerifier::new("").is_err());
    }

    #[test]
    fn test_garbage_token_rejected() {
        let verifier = AuthVerifier::new(SECRET).unwrap();
        assert!(verifier.verify("not.a.token").is_err());
    }
}
