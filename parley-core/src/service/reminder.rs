//! Reminder scheduler.
//!
//! A single periodic tick (one minute) with two passes: fire due reminders
//! (email fan-out and in-app pushes), then garbage-collect idle instant
//! meetings. Single-instance by assumption; running replicas concurrently
//! requires an external lease, which is not implemented here.

use serde::Serialize;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio::time::{interval, Duration};
use tracing::{debug, error, info, warn};

use crate::models::{MeetingId, ParticipantStatus, ReminderKind};
use crate::repository::{
    DueReminder, MeetingRepository, ParticipantRepository, ReminderRepository,
};
use crate::service::email::EmailService;
use crate::Result;

/// How many due reminders a single tick will pick up.
const REMINDER_BATCH: i64 = 50;

const TICK: Duration = Duration::from_secs(60);

/// Payload of an in-app `reminder` push.
#[derive(Debug, Clone, Serialize)]
pub struct ReminderEvent {
    #[serde(rename = "type")]
    pub kind: String,
    pub meeting_id: MeetingId,
    pub meeting_title: String,
    pub meeting_code: String,
    pub minutes_before: i32,
    pub target_email: String,
}

/// The scheduler's view of the signaling layer: deliver in-app reminders and
/// report which meetings still have live connections.
pub trait ReminderSink: Send + Sync {
    /// Push a reminder to every live connection authenticated as `email`.
    fn push_reminder(&self, email: &str, event: &ReminderEvent);

    /// Meeting ids with at least one live signaling connection, consulted by
    /// the idle-meeting GC.
    fn connected_meetings(&self) -> Vec<MeetingId>;
}

pub struct ReminderScheduler {
    reminders: ReminderRepository,
    meetings: MeetingRepository,
    participants: ParticipantRepository,
    email: EmailService,
    sink: Arc<dyn ReminderSink>,
}

impl ReminderScheduler {
    pub fn new(
        reminders: ReminderRepository,
        meetings: MeetingRepository,
        participants: ParticipantRepository,
        email: EmailService,
        sink: Arc<dyn ReminderSink>,
    ) -> Self {
        Self {
            reminders,
            meetings,
            participants,
            email,
            sink,
        }
    }

    /// Start the periodic tick. The returned handle is aborted on shutdown.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = interval(TICK);
            info!("Reminder scheduler started (interval: 60s)");

            loop {
                ticker.tick().await;
                if let Err(e) = self.fire_due_reminders().await {
                    error!(error = %e, "Reminder pass failed");
                }
                if let Err(e) = self.collect_idle_meetings().await {
                    error!(error = %e, "Idle-meeting GC pass failed");
                }
            }
        })
    }

    /// Pass A: fire due reminders. Partial failures leave the row unsent so
    /// the next tick retries; individual send errors are logged, not raised.
    async fn fire_due_reminders(&self) -> Result<()> {
        let due = self.reminders.due(REMINDER_BATCH).await?;
        if due.is_empty() {
            return Ok(());
        }
        debug!(count = due.len(), "Firing due reminders");

        for item in due {
            match self.fire_one(&item).await {
                Ok(()) => self.reminders.mark_sent(&item.reminder.id).await?,
                Err(e) => {
                    warn!(
                        reminder_id = %item.reminder.id,
                        error = %e,
                        "Reminder left unsent, will retry next tick"
                    );
                }
            }
        }

        Ok(())
    }

    async fn fire_one(&self, item: &DueReminder) -> Result<()> {
        let recipients = self
            .participants
            .list_with_users(&item.reminder.meeting_id, None)
            .await?;

        match item.reminder.kind {
            ReminderKind::Email => {
                let mut all_sent = true;
                for recipient in recipients
                    .iter()
                    .filter(|r| r.participant.status != ParticipantStatus::Removed)
                {
                    if let Err(e) = self
                        .email
                        .send_reminder(
                            &recipient.email,
                            &item.meeting_title,
                            &item.meeting_code,
                            item.reminder.minutes_before,
                        )
                        .await
                    {
                        error!(
                            reminder_id = %item.reminder.id,
                            error = %e,
                            "Reminder email failed"
                        );
                        all_sent = false;
                    }
                }
                if all_sent {
                    Ok(())
                } else {
                    Err(crate::Error::Upstream(
                        "One or more reminder emails failed".to_string(),
                    ))
                }
            }
            ReminderKind::InApp => {
                for recipient in recipients
                    .iter()
                    .filter(|r| r.participant.status != ParticipantStatus::Removed)
                {
                    let event = ReminderEvent {
                        kind: "in_app".to_string(),
                        meeting_id: item.reminder.meeting_id.clone(),
                        meeting_title: item.meeting_title.clone(),
                        meeting_code: item.meeting_code.clone(),
                        minutes_before: item.reminder.minutes_before,
                        target_email: recipient.email.clone(),
                    };
                    self.sink.push_reminder(&recipient.email, &event);
                }
                Ok(())
            }
        }
    }

    /// Pass B: delete instant meetings that were never joined within 30
    /// minutes, or went live and have been abandoned for 30 minutes with no
    /// remaining connection. Dependent rows cascade.
    async fn collect_idle_meetings(&self) -> Result<()> {
        let connected = self.sink.connected_meetings();
        let deleted = self.meetings.delete_idle_instant(&connected).await?;

        if !deleted.is_empty() {
            info!(count = deleted.len(), "Collected idle instant meetings");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {

    #[tokio::test]
    #[ignore = "Requires database"]
    async fn test_partial_email_failure_retries_next_tick() {
        // Integration test placeholder
    }
}
