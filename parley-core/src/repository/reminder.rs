use sqlx::{postgres::PgRow, PgPool, Row};
use std::str::FromStr;

use crate::{
    models::{Reminder, ReminderId, ReminderKind},
    Error, Result,
};

/// A due reminder joined with its meeting, ready for fan-out.
#[derive(Debug, Clone)]
pub struct DueReminder {
    pub reminder: Reminder,
    pub meeting_title: String,
    pub meeting_code: String,
}

/// Reminder repository for database operations
#[derive(Clone)]
pub struct ReminderRepository {
    pool: PgPool,
}

impl ReminderRepository {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Unsent reminders whose trigger time has passed, joined with the
    /// meeting. At most `limit` per tick; the rest wait for the next one.
    pub async fn due(&self, limit: i64) -> Result<Vec<DueReminder>> {
        let rows = sqlx::query(
            r"
            SELECT r.id, r.meeting_id, r.kind, r.minutes_before, r.trigger_at,
                   r.sent, r.created_at,
                   m.title AS meeting_title, m.code AS meeting_code
            FROM reminders r
            JOIN meetings m ON m.id = r.meeting_id
            WHERE r.sent = FALSE AND r.trigger_at <= NOW()
            ORDER BY r.trigger_at
            LIMIT $1
            ",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                Ok(DueReminder {
                    reminder: row_to_reminder(row)?,
                    meeting_title: row.try_get("meeting_title")?,
                    meeting_code: row.try_get("meeting_code")?,
                })
            })
            .collect()
    }

    /// Marked only after a fully successful fan-out; a partially failed
    /// reminder stays unsent and is retried next tick.
    pub async fn mark_sent(&self, reminder_id: &ReminderId) -> Result<()> {
        sqlx::query("UPDATE reminders SET sent = TRUE WHERE id = $1")
            .bind(reminder_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}

fn row_to_reminder(row: &PgRow) -> Result<Reminder> {
    let kind: String = row.try_get("kind")?;
    Ok(Reminder {
        id: row.try_get("id")?,
        meeting_id: row.try_get("meeting_id")?,
        kind: ReminderKind::from_str(&kind).map_err(Error::Internal)?,
        minutes_before: row.try_get("minutes_before")?,
        trigger_at: row.try_get("trigger_at")?,
        sent: row.try_get("sent")?,
        created_at: row.try_get("created_at")?,
    })
}
