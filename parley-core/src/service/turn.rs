//! Time-limited TURN credentials.
//!
//! RFC 5389 long-term credentials compatible with coturn's
//! `static-auth-secret` mode: username `<expiry_timestamp>:meetuser`,
//! credential `base64(HMAC-SHA1(secret, username))`.

use base64::Engine;
use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use serde::Serialize;
use sha1::Sha1;

use crate::config::TurnConfig;
use crate::{Error, Result};

/// Fixed user label inside the TURN username; identity is not part of the
/// credential, the expiry timestamp is what the TURN server checks.
const TURN_USER: &str = "meetuser";

#[derive(Debug, Clone, Serialize)]
pub struct TurnCredentials {
    pub urls: Vec<String>,
    pub username: String,
    pub credential: String,
    #[serde(skip)]
    pub expires_at: DateTime<Utc>,
}

/// TURN credential generation service
#[derive(Clone)]
pub struct TurnCredentialService {
    config: TurnConfig,
}

impl TurnCredentialService {
    #[must_use]
    pub const fn new(config: TurnConfig) -> Self {
        Self { config }
    }

    /// Generate credentials valid for `credential_ttl_seconds` from now.
    pub fn generate(&self) -> Result<TurnCredentials> {
        if self.config.server_url.is_empty() || self.config.static_secret.is_empty() {
            return Err(Error::Upstream("TURN server not configured".to_string()));
        }

        let expires_at = Utc::now()
            + Duration::seconds(
                i64::try_from(self.config.credential_ttl_seconds).unwrap_or(86400),
            );
        let username = format!("{}:{TURN_USER}", expires_at.timestamp());
        let credential = self.compute_hmac(&username)?;

        let mut urls = vec![self.config.server_url.clone()];
        if !self.config.stun_url.is_empty() {
            urls.push(self.config.stun_url.clone());
        }

        Ok(TurnCredentials {
            urls,
            username,
            credential,
            expires_at,
        })
    }

    fn compute_hmac(&self, username: &str) -> Result<String> {
        let mut mac = Hmac::<Sha1>::new_from_slice(self.config.static_secret.as_bytes())
            .map_err(|e| Error::Internal(format!("Failed to create HMAC: {e}")))?;

        mac.update(username.as_bytes());
        let result = mac.finalize();
        Ok(base64::engine::general_purpose::STANDARD.encode(result.into_bytes()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> TurnCredentialService {
        TurnCredentialService::new(TurnConfig {
            server_url: "turn:turn.example.com:3478".to_string(),
            static_secret: "test_secret_key_1234567890abcdefgh".to_string(),
            credential_ttl_seconds: 86400,
            stun_url: "stun:stun.l.google.com:19302".to_string(),
        })
    }

    #[test]
    fn test_generate_credentials() {
        let creds = service().generate().unwrap();

        // Username is "<expiry>:meetuser" with expiry roughly a day out
        let (ts, user) = creds.username.split_once(':').unwrap();
        assert_eq!(user, "meetuser");
        let expiry: i64 = ts.parse().unwrap();
        assert!(expiry > Utc::now().timestamp() + 86000);

        // Credential is valid base64 of a 20-byte SHA-1 MAC
        let raw = base64::engine::general_purpose::STANDARD
            .decode(&creds.credential)
            .unwrap();
        assert_eq!(raw.len(), 20);

        // Both TURN and STUN urls are returned
        assert_eq!(creds.urls.len(), 2);
        assert!(creds.urls[0].starts_with("turn:"));
        assert!(creds.urls[1].starts_with("stun:"));
    }

    #[test]
    fn test_hmac_deterministic() {
        let service = service();
        let a = service.compute_hmac("12345:meetuser").unwrap();
        let b = service.compute_hmac("12345:meetuser").unwrap();
        assert_eq!(a, b);

        let c = service.compute_hmac("12346:meetuser").unwrap();
        assert_ne!(a, c);
    }

    #[test]
    fn test_unconfigured_turn_errors() {
        let service = TurnCredentialService::new(TurnConfig::default());
        assert!(service.generate().is_err());
    }
}
