use nanoid::nanoid;
use rand::{rngs::OsRng, Rng};
use serde::{Deserialize, Serialize};

/// Generate a 12-character nanoid for entity IDs
pub fn generate_id() -> String {
    nanoid!(12)
}

/// Declares a CHAR(12) nanoid entity ID newtype with transparent serde and
/// Postgres TEXT mapping. Keeps the distinct ID spaces from mixing at
/// compile time.
macro_rules! entity_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            #[must_use]
            pub fn new() -> Self {
                Self(generate_id())
            }

            #[must_use]
            pub const fn from_string(id: String) -> Self {
                Self(id)
            }

            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl sqlx::Type<sqlx::Postgres> for $name {
            fn type_info() -> sqlx::postgres::PgTypeInfo {
                <String as sqlx::Type<sqlx::Postgres>>::type_info()
            }
        }

        impl sqlx::Encode<'_, sqlx::Postgres> for $name {
            fn encode_by_ref(
                &self,
                buf: &mut sqlx::postgres::PgArgumentBuffer,
            ) -> Result<sqlx::encode::IsNull, Box<dyn std::error::Error + Send + Sync>>
            {
                <String as sqlx::Encode<'_, sqlx::Postgres>>::encode_by_ref(&self.0, buf)
            }
        }

        impl<'r> sqlx::Decode<'r, sqlx::Postgres> for $name {
            fn decode(
                value: sqlx::postgres::PgValueRef<'r>,
            ) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
                let s = <String as sqlx::Decode<'r, sqlx::Postgres>>::decode(value)?;
                Ok(Self(s))
            }
        }
    };
}

entity_id! {
    /// User ID (CHAR(12) nanoid)
    UserId
}

entity_id! {
    /// Meeting ID (CHAR(12) nanoid), distinct from the human-shareable code
    MeetingId
}

entity_id! {
    /// Participant row ID (CHAR(12) nanoid)
    ParticipantId
}

entity_id! {
    /// Breakout room ID (CHAR(12) nanoid)
    BreakoutRoomId
}

entity_id! {
    /// Question ID (CHAR(12) nanoid)
    QuestionId
}

entity_id! {
    /// Reminder ID (CHAR(12) nanoid)
    ReminderId
}

/// Ephemeral connection ID, assigned when a signaling connection is
/// accepted. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnId(pub String);

impl ConnId {
    #[must_use]
    pub fn new() -> Self {
        Self(nanoid!(16))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ConnId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ConnId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

const CODE_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz";

/// Generate a human-shareable meeting code: `xxx-xxxx-xxx`, lowercase ASCII,
/// drawn from the OS CSPRNG.
#[must_use]
pub fn generate_meeting_code() -> String {
    let mut rng = OsRng;
    let mut segment = |len: usize| -> String {
        (0..len)
            .map(|_| CODE_ALPHABET[rng.gen_range(0..CODE_ALPHABET.len())] as char)
            .collect()
    };
    format!("{}-{}-{}", segment(3), segment(4), segment(3))
}

/// Check a candidate string against the meeting code format.
#[must_use]
pub fn is_valid_meeting_code(code: &str) -> bool {
    let parts: Vec<&str> = code.split('-').collect();
    if parts.len() != 3 {
        return false;
    }
    let lens = [3usize, 4, 3];
    parts
        .iter()
        .zip(lens)
        .all(|(part, len)| part.len() == len && part.bytes().all(|b| b.is_ascii_lowercase()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_id() {
        let id = generate_id();
        assert_eq!(id.len(), 12);
    }

    #[test]
    fn test_ids_are_unique() {
        assert_ne!(UserId::new(), UserId::new());
        assert_ne!(MeetingId::new(), MeetingId::new());
        assert_ne!(ConnId::new(), ConnId::new());
    }

    #[test]
    fn test_meeting_code_format() {
        for _ in 0..100 {
            let code = generate_meeting_code();
            assert!(is_valid_meeting_code(&code), "bad code: {code}");
        }
    }

    #[test]
    fn test_meeting_code_validation() {
        assert!(is_valid_meeting_code("abc-defg-hij"));
        assert!(!is_valid_meeting_code("abc-defg-hijk"));
        assert!(!is_valid_meeting_code("ab-defg-hij"));
        assert!(!is_valid_meeting_code("abc-defg"));
        assert!(!is_valid_meeting_code("ABC-DEFG-HIJ"));
        assert!(!is_valid_meeting_code("ab1-defg-hij"));
        assert!(!is_valid_meeting_code(""));
    }
}
