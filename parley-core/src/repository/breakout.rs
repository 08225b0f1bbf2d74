use sqlx::{postgres::PgRow, PgPool, Row};

use crate::{
    models::{BreakoutRoom, MeetingId},
    Result,
};

/// Breakout room repository for database operations
#[derive(Clone)]
pub struct BreakoutRepository {
    pool: PgPool,
}

impl BreakoutRepository {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, room: &BreakoutRoom) -> Result<BreakoutRoom> {
        let row = sqlx::query(
            r"
            INSERT INTO breakout_rooms (id, meeting_id, name, is_active, ends_at, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, meeting_id, name, is_active, ends_at, created_at
            ",
        )
        .bind(&room.id)
        .bind(&room.meeting_id)
        .bind(&room.name)
        .bind(room.is_active)
        .bind(room.ends_at)
        .bind(room.created_at)
        .fetch_one(&self.pool)
        .await?;

        row_to_breakout(&row)
    }

    pub async fn list_active(&self, meeting_id: &MeetingId) -> Result<Vec<BreakoutRoom>> {
        let rows = sqlx::query(
            r"
            SELECT id, meeting_id, name, is_active, ends_at, created_at
            FROM breakout_rooms
            WHERE meeting_id = $1 AND is_active = TRUE
            ORDER BY created_at
            ",
        )
        .bind(meeting_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_breakout).collect()
    }

    /// Deactivate every active breakout of a meeting, returning how many
    /// were closed.
    pub async fn deactivate_all(&self, meeting_id: &MeetingId) -> Result<u64> {
        let result = sqlx::query(
            r"
            UPDATE breakout_rooms
            SET is_active = FALSE
            WHERE meeting_id = $1 AND is_active = TRUE
            ",
        )
        .bind(meeting_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}

fn row_to_breakout(row: &PgRow) -> Result<BreakoutRoom> {
    Ok(BreakoutRoom {
        id: row.try_get("id")?,
        meeting_id: row.try_get("meeting_id")?,
        name: row.try_get("name")?,
        is_active: row.try_get("is_active")?,
        ends_at: row.try_get("ends_at")?,
        created_at: row.try_get("created_at")?,
    })
}
