use sqlx::{postgres::PgRow, PgPool, Row};

use crate::{models::Invitation, Result};

/// Invitation repository for database operations
#[derive(Clone)]
pub struct InvitationRepository {
    pool: PgPool,
}

impl InvitationRepository {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert an invitation; re-inviting the same address is a no-op that
    /// returns the existing row.
    pub async fn create(&self, invitation: &Invitation) -> Result<Invitation> {
        let row = sqlx::query(
            r"
            INSERT INTO invitations (id, meeting_id, email, invited_by, created_at)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (meeting_id, email) DO UPDATE SET invited_by = EXCLUDED.invited_by
            RETURNING id, meeting_id, email, invited_by, created_at
            ",
        )
        .bind(&invitation.id)
        .bind(&invitation.meeting_id)
        .bind(&invitation.email)
        .bind(&invitation.invited_by)
        .bind(invitation.created_at)
        .fetch_one(&self.pool)
        .await?;

        row_to_invitation(&row)
    }
}

fn row_to_invitation(row: &PgRow) -> Result<Invitation> {
    Ok(Invitation {
        id: row.try_get("id")?,
        meeting_id: row.try_get("meeting_id")?,
        email: row.try_get("email")?,
        invited_by: row.try_get("invited_by")?,
        created_at: row.try_get("created_at")?,
    })
}
