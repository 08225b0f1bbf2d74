use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Database error: {0}")]
    Database(sqlx::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Unauthenticated: {0}")]
    Unauthenticated(String),

    #[error("Not bound to a meeting")]
    NotBound,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Already exists: {0}")]
    AlreadyExists(String),

    #[error("Codec incompatible")]
    CodecIncompatible,

    #[error("Rate limited")]
    RateLimited,

    #[error("Upstream unavailable: {0}")]
    Upstream(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sqlx::Error> for Error {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            // Map "no rows" to NotFound
            sqlx::Error::RowNotFound => Self::NotFound("Resource not found".to_string()),
            sqlx::Error::Database(db_err) => {
                let code = db_err.code().unwrap_or_default();
                match code.as_ref() {
                    // PostgreSQL unique_violation: the toggle/uniqueness mechanism
                    "23505" => Self::AlreadyExists("Resource already exists".to_string()),
                    // PostgreSQL foreign_key_violation
                    "23503" => Self::NotFound("Referenced resource not found".to_string()),
                    // PostgreSQL check_violation / not_null_violation
                    "23514" | "23502" => {
                        Self::InvalidArgument("Constraint check failed".to_string())
                    }
                    _ => Self::Database(err),
                }
            }
            _ => Self::Database(err),
        }
    }
}

impl Error {
    /// Human message delivered in an ack payload as `{error: ...}`.
    ///
    /// User-addressable variants surface their message verbatim; internal
    /// variants are collapsed so the wire never reveals identifiers or
    /// infrastructure details of non-addressable resources.
    pub fn ack_message(&self) -> String {
        match self {
            Self::Database(_) | Self::Serialization(_) | Self::Internal(_) => {
                "Internal error".to_string()
            }
            Self::Upstream(_) => "Service temporarily unavailable".to_string(),
            Self::Unauthenticated(msg)
            | Self::NotFound(msg)
            | Self::PermissionDenied(msg)
            | Self::InvalidArgument(msg)
            | Self::InvalidState(msg)
            | Self::AlreadyExists(msg) => msg.clone(),
            Self::NotBound => "Join a meeting first".to_string(),
            Self::CodecIncompatible => {
                "Cannot consume this producer with the given capabilities".to_string()
            }
            // Never surfaced: rate-limited requests get no ack at all
            Self::RateLimited => String::new(),
        }
    }

    /// Rate-limited requests are dropped without any ack at all.
    pub const fn is_silent(&self) -> bool {
        matches!(self, Self::RateLimited)
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ack_message_hides_internals() {
        let err = Error::Internal("connection pool exhausted at 10.0.0.3".to_string());
        assert_eq!(err.ack_message(), "Internal error");

        let err = Error::Upstream("worker 4 died".to_string());
        assert_eq!(err.ack_message(), "Service temporarily unavailable");
    }

    #[test]
    fn test_ack_message_passes_user_errors() {
        let err = Error::AlreadyExists("Someone is already sharing their screen".to_string());
        assert_eq!(err.ack_message(), "Someone is already sharing their screen");
    }

    #[test]
    fn test_rate_limited_is_silent() {
        assert!(Error::RateLimited.is_silent());
        assert!(!Error::NotBound.is_silent());
    }
}
