use sqlx::{postgres::PgRow, PgPool, Row};

use crate::{
    models::{ChatMessage, ChatMessageWithSender, MeetingId},
    Result,
};

/// Chat message repository for database operations
#[derive(Clone)]
pub struct ChatRepository {
    pool: PgPool,
}

impl ChatRepository {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, message: &ChatMessage) -> Result<ChatMessage> {
        let row = sqlx::query(
            r"
            INSERT INTO chat_messages (id, meeting_id, user_id, content, created_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, meeting_id, user_id, content, created_at
            ",
        )
        .bind(&message.id)
        .bind(&message.meeting_id)
        .bind(&message.user_id)
        .bind(&message.content)
        .bind(message.created_at)
        .fetch_one(&self.pool)
        .await?;

        row_to_message(&row)
    }

    /// History payload: the most recent messages, returned ascending by
    /// `created_at`. Capped at 100 per request.
    pub async fn history(
        &self,
        meeting_id: &MeetingId,
        limit: i32,
    ) -> Result<Vec<ChatMessageWithSender>> {
        let limit = limit.min(100);

        let rows = sqlx::query(
            r"
            SELECT c.id, c.meeting_id, c.user_id, c.content, c.created_at, u.name AS sender_name
            FROM chat_messages c
            JOIN users u ON u.id = c.user_id
            WHERE c.meeting_id = $1
            ORDER BY c.created_at DESC
            LIMIT $2
            ",
        )
        .bind(meeting_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        let mut messages: Vec<ChatMessageWithSender> = rows
            .iter()
            .map(|row| {
                Ok(ChatMessageWithSender {
                    message: row_to_message(row)?,
                    sender_name: row.try_get("sender_name")?,
                })
            })
            .collect::<Result<_>>()?;

        // Fetched newest-first for the LIMIT, delivered oldest-first
        messages.reverse();
        Ok(messages)
    }
}

fn row_to_message(row: &PgRow) -> Result<ChatMessage> {
    Ok(ChatMessage {
        id: row.try_get("id")?,
        meeting_id: row.try_get("meeting_id")?,
        user_id: row.try_get("user_id")?,
        content: row.try_get("content")?,
        created_at: row.try_get("created_at")?,
    })
}

#[cfg(test)]
mod tests {

    #[tokio::test]
    #[ignore = "Requires database"]
    async fn test_history_is_ascending_and_capped() {
        // Integration test placeholder
    }
}
