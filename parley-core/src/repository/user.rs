use sqlx::{postgres::PgRow, PgPool, Row};

use crate::{
    models::{User, UserId},
    Result,
};

/// User repository for database operations
#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Upsert the identity snapshot carried by a verified token. Called on
    /// every join so rosters always show current names and avatars.
    pub async fn upsert(&self, user: &User) -> Result<User> {
        let row = sqlx::query(
            r"
            INSERT INTO users (id, name, email, avatar_url, created_at)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (id) DO UPDATE
                SET name = EXCLUDED.name,
                    email = EXCLUDED.email,
                    avatar_url = EXCLUDED.avatar_url
            RETURNING id, name, email, avatar_url, created_at
            ",
        )
        .bind(&user.id)
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.avatar_url)
        .bind(user.created_at)
        .fetch_one(&self.pool)
        .await?;

        row_to_user(&row)
    }

    pub async fn get_by_id(&self, user_id: &UserId) -> Result<Option<User>> {
        let row = sqlx::query(
            r"
            SELECT id, name, email, avatar_url, created_at
            FROM users
            WHERE id = $1
            ",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(row_to_user).transpose()
    }
}

fn row_to_user(row: &PgRow) -> Result<User> {
    Ok(User {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        email: row.try_get("email")?,
        avatar_url: row.try_get("avatar_url")?,
        created_at: row.try_get("created_at")?,
    })
}

#[cfg(test)]
mod tests {

    #[tokio::test]
    #[ignore = "Requires database"]
    async fn test_upsert_refreshes_identity() {
        // Integration test placeholder
    }
}
