use chrono::Utc;
use sqlx::{postgres::PgRow, PgPool, Row};
use std::str::FromStr;

use crate::{
    models::{
        BreakoutRoomId, MeetingId, Participant, ParticipantId, ParticipantStatus,
        ParticipantWithUser, Role, UserId,
    },
    Error, Result,
};

const PARTICIPANT_COLUMNS: &str =
    "id, user_id, meeting_id, role, status, breakout_room_id, joined_at, left_at";

/// Participant repository. The admission state machine is the only caller
/// that mutates `role` and `status` through here.
#[derive(Clone)]
pub struct ParticipantRepository {
    pool: PgPool,
}

impl ParticipantRepository {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, participant: &Participant) -> Result<Participant> {
        let row = sqlx::query(&format!(
            r"
            INSERT INTO participants
                (id, user_id, meeting_id, role, status, breakout_room_id, joined_at, left_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {PARTICIPANT_COLUMNS}
            ",
        ))
        .bind(&participant.id)
        .bind(&participant.user_id)
        .bind(&participant.meeting_id)
        .bind(participant.role.as_str())
        .bind(participant.status.as_str())
        .bind(&participant.breakout_room_id)
        .bind(participant.joined_at)
        .bind(participant.left_at)
        .fetch_one(&self.pool)
        .await?;

        row_to_participant(&row)
    }

    pub async fn get_by_id(&self, participant_id: &ParticipantId) -> Result<Option<Participant>> {
        let row = sqlx::query(&format!(
            "SELECT {PARTICIPANT_COLUMNS} FROM participants WHERE id = $1"
        ))
        .bind(participant_id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(row_to_participant).transpose()
    }

    pub async fn get_by_user_and_meeting(
        &self,
        user_id: &UserId,
        meeting_id: &MeetingId,
    ) -> Result<Option<Participant>> {
        let row = sqlx::query(&format!(
            "SELECT {PARTICIPANT_COLUMNS} FROM participants WHERE user_id = $1 AND meeting_id = $2"
        ))
        .bind(user_id)
        .bind(meeting_id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(row_to_participant).transpose()
    }

    pub async fn set_status(
        &self,
        participant_id: &ParticipantId,
        status: ParticipantStatus,
    ) -> Result<()> {
        sqlx::query(
            r"
            UPDATE participants
            SET status = $2, breakout_room_id = NULL
            WHERE id = $1
            ",
        )
        .bind(participant_id)
        .bind(status.as_str())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Move a participant into a breakout: status and breakout_room_id are
    /// written together so the non-null-iff-in-breakout invariant holds.
    pub async fn set_breakout(
        &self,
        participant_id: &ParticipantId,
        breakout_room_id: &BreakoutRoomId,
    ) -> Result<()> {
        sqlx::query(
            r"
            UPDATE participants
            SET status = 'in_breakout', breakout_room_id = $2
            WHERE id = $1
            ",
        )
        .bind(participant_id)
        .bind(breakout_room_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Revert every breakout participant of a meeting to the main scope.
    pub async fn clear_breakouts(&self, meeting_id: &MeetingId) -> Result<u64> {
        let result = sqlx::query(
            r"
            UPDATE participants
            SET status = 'in_meeting', breakout_room_id = NULL
            WHERE meeting_id = $1 AND status = 'in_breakout'
            ",
        )
        .bind(meeting_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    /// Disconnect stamps `left_at` without touching `status`, so an abrupt
    /// drop can reconnect without a second lobby hold.
    pub async fn mark_left(&self, participant_id: &ParticipantId) -> Result<()> {
        sqlx::query("UPDATE participants SET left_at = $2 WHERE id = $1")
            .bind(participant_id)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Rejoin clears the `left_at` stamp.
    pub async fn clear_left(&self, participant_id: &ParticipantId) -> Result<()> {
        sqlx::query("UPDATE participants SET left_at = NULL WHERE id = $1")
            .bind(participant_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Demote the current host, promote the target, and repoint the meeting
    /// row, all in one transaction. Fails without effect when the target row
    /// is missing or removed.
    pub async fn transfer_host(
        &self,
        meeting_id: &MeetingId,
        new_host: &ParticipantId,
    ) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r"
            UPDATE participants SET role = 'participant'
            WHERE meeting_id = $1 AND role = 'host'
            ",
        )
        .bind(meeting_id)
        .execute(&mut *tx)
        .await?;

        let promoted = sqlx::query(
            r"
            UPDATE participants SET role = 'host'
            WHERE id = $1 AND meeting_id = $2 AND status != 'removed'
            RETURNING user_id
            ",
        )
        .bind(new_host)
        .bind(meeting_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(row) = promoted else {
            // Rolls back the demotion on drop
            return Err(Error::NotFound("Participant not found".to_string()));
        };
        let new_host_user: UserId = row.try_get("user_id")?;

        sqlx::query("UPDATE meetings SET host_user_id = $2 WHERE id = $1")
            .bind(meeting_id)
            .bind(&new_host_user)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    /// Full roster with user columns, optionally filtered by status.
    pub async fn list_with_users(
        &self,
        meeting_id: &MeetingId,
        status: Option<ParticipantStatus>,
    ) -> Result<Vec<ParticipantWithUser>> {
        let rows = if let Some(status) = status {
            sqlx::query(
                r"
                SELECT p.id, p.user_id, p.meeting_id, p.role, p.status,
                       p.breakout_room_id, p.joined_at, p.left_at,
                       u.name, u.email, u.avatar_url
                FROM participants p
                JOIN users u ON u.id = p.user_id
                WHERE p.meeting_id = $1 AND p.status = $2
                ORDER BY p.joined_at
                ",
            )
            .bind(meeting_id)
            .bind(status.as_str())
            .fetch_all(&self.pool)
            .await?
        } else {
            sqlx::query(
                r"
                SELECT p.id, p.user_id, p.meeting_id, p.role, p.status,
                       p.breakout_room_id, p.joined_at, p.left_at,
                       u.name, u.email, u.avatar_url
                FROM participants p
                JOIN users u ON u.id = p.user_id
                WHERE p.meeting_id = $1 AND p.status != 'removed'
                ORDER BY p.joined_at
                ",
            )
            .bind(meeting_id)
            .fetch_all(&self.pool)
            .await?
        };

        rows.iter().map(row_to_participant_with_user).collect()
    }
}

fn row_to_participant(row: &PgRow) -> Result<Participant> {
    let role: String = row.try_get("role")?;
    let status: String = row.try_get("status")?;
    Ok(Participant {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        meeting_id: row.try_get("meeting_id")?,
        role: Role::from_str(&role).map_err(Error::Internal)?,
        status: ParticipantStatus::from_str(&status).map_err(Error::Internal)?,
        breakout_room_id: row.try_get("breakout_room_id")?,
        joined_at: row.try_get("joined_at")?,
        left_at: row.try_get("left_at")?,
    })
}

fn row_to_participant_with_user(row: &PgRow) -> Result<ParticipantWithUser> {
    Ok(ParticipantWithUser {
        participant: row_to_participant(row)?,
        name: row.try_get("name")?,
        email: row.try_get("email")?,
        avatar_url: row.try_get("avatar_url")?,
    })
}

#[cfg(test)]
mod tests {

    #[tokio::test]
    #[ignore = "Requires database"]
    async fn test_transfer_host_is_atomic() {
        // Integration test placeholder
    }

    #[tokio::test]
    #[ignore = "Requires database"]
    async fn test_unique_user_per_meeting() {
        // Integration test placeholder
    }
}
