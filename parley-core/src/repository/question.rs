use sqlx::{postgres::PgRow, PgPool, Row};

use crate::{
    models::{MeetingId, Question, QuestionId, UpvoteResult, UserId},
    Result,
};

/// Question and upvote repository.
///
/// The `(question_id, user_id)` primary key on `question_upvotes` is what
/// makes the toggle idempotent under racing requests: two concurrent inserts
/// from the same user collapse to one row, and the loser of the race turns
/// into the delete half of the toggle.
#[derive(Clone)]
pub struct QuestionRepository {
    pool: PgPool,
}

impl QuestionRepository {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, question: &Question) -> Result<Question> {
        let row = sqlx::query(
            r"
            INSERT INTO questions (id, meeting_id, user_id, content, is_answered, is_pinned, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, meeting_id, user_id, content, is_answered, is_pinned, created_at
            ",
        )
        .bind(&question.id)
        .bind(&question.meeting_id)
        .bind(&question.user_id)
        .bind(&question.content)
        .bind(question.is_answered)
        .bind(question.is_pinned)
        .bind(question.created_at)
        .fetch_one(&self.pool)
        .await?;

        row_to_question(&row)
    }

    pub async fn get_by_id(&self, question_id: &QuestionId) -> Result<Option<Question>> {
        let row = sqlx::query(
            r"
            SELECT id, meeting_id, user_id, content, is_answered, is_pinned, created_at
            FROM questions
            WHERE id = $1
            ",
        )
        .bind(question_id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(row_to_question).transpose()
    }

    /// Toggle an upvote. Insert-or-delete against the unique pair, then
    /// recount.
    pub async fn toggle_upvote(
        &self,
        question_id: &QuestionId,
        user_id: &UserId,
    ) -> Result<UpvoteResult> {
        let inserted = sqlx::query(
            r"
            INSERT INTO question_upvotes (question_id, user_id)
            VALUES ($1, $2)
            ON CONFLICT (question_id, user_id) DO NOTHING
            ",
        )
        .bind(question_id)
        .bind(user_id)
        .execute(&self.pool)
        .await?
        .rows_affected()
            == 1;

        if !inserted {
            sqlx::query(
                r"
                DELETE FROM question_upvotes
                WHERE question_id = $1 AND user_id = $2
                ",
            )
            .bind(question_id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        }

        let upvote_count = self.upvote_count(question_id).await?;
        Ok(UpvoteResult {
            upvote_count,
            has_upvoted: inserted,
        })
    }

    pub async fn upvote_count(&self, question_id: &QuestionId) -> Result<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM question_upvotes WHERE question_id = $1")
                .bind(question_id)
                .fetch_one(&self.pool)
                .await?;

        Ok(count)
    }

    /// Flip the answered flag, returning the new value. Host-only at the
    /// dispatch layer.
    pub async fn toggle_answered(&self, question_id: &QuestionId) -> Result<bool> {
        let answered: bool = sqlx::query_scalar(
            r"
            UPDATE questions
            SET is_answered = NOT is_answered
            WHERE id = $1
            RETURNING is_answered
            ",
        )
        .bind(question_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(answered)
    }

    /// Flip the pinned flag, returning the new value.
    pub async fn toggle_pinned(&self, question_id: &QuestionId) -> Result<bool> {
        let pinned: bool = sqlx::query_scalar(
            r"
            UPDATE questions
            SET is_pinned = NOT is_pinned
            WHERE id = $1
            RETURNING is_pinned
            ",
        )
        .bind(question_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(pinned)
    }

    pub async fn list_by_meeting(&self, meeting_id: &MeetingId) -> Result<Vec<Question>> {
        let rows = sqlx::query(
            r"
            SELECT id, meeting_id, user_id, content, is_answered, is_pinned, created_at
            FROM questions
            WHERE meeting_id = $1
            ORDER BY created_at
            ",
        )
        .bind(meeting_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_question).collect()
    }
}

fn row_to_question(row: &PgRow) -> Result<Question> {
    Ok(Question {
        id: row.try_get("id")?,
        meeting_id: row.try_get("meeting_id")?,
        user_id: row.try_get("user_id")?,
        content: row.try_get("content")?,
        is_answered: row.try_get("is_answered")?,
        is_pinned: row.try_get("is_pinned")?,
        created_at: row.try_get("created_at")?,
    })
}

#[cfg(test)]
mod tests {

    #[tokio::test]
    #[ignore = "Requires database"]
    async fn test_upvote_toggle_never_exceeds_one_row() {
        // Integration test placeholder: concurrent toggles from the same
        // user must leave 0 or 1 rows, never 2.
    }
}
