use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::UserId;

/// Stable identity. Immutable within a session; refreshed from the verified
/// token claims on each connect.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub avatar_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn new(id: UserId, name: String, email: String, avatar_url: Option<String>) -> Self {
        Self {
            id,
            name,
            email,
            avatar_url,
            created_at: Utc::now(),
        }
    }
}
