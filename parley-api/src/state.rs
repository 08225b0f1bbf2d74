//! Process-wide server context.
//!
//! Everything the request-handling path needs hangs off this one value so
//! tests can instantiate an isolated server: the room registry, the worker
//! pool, the broadcast hub, the rate-limit table, and the durable-state
//! services.

use dashmap::DashMap;
use std::sync::Arc;
use std::time::Instant;
use tokio::task::JoinHandle;

use parley_core::models::MeetingId;
use parley_core::repository::{
    BreakoutRepository, ChatRepository, InvitationRepository, QuestionRepository,
};
use parley_core::service::{
    AdmissionService, AuthVerifier, EmailService, RateLimiter, TurnCredentialService,
};
use parley_core::Config;
use parley_sfu::WorkerPool;

use crate::hub::BroadcastHub;
use crate::rtc::RoomRegistry;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub verifier: AuthVerifier,
    pub admission: AdmissionService,
    pub chats: ChatRepository,
    pub questions: QuestionRepository,
    pub breakout_rooms: BreakoutRepository,
    pub invitations: InvitationRepository,
    pub email: EmailService,
    pub turn: TurnCredentialService,
    pub limiter: RateLimiter,
    pub hub: Arc<BroadcastHub>,
    pub rooms: Arc<RoomRegistry>,
    pub workers: Arc<WorkerPool>,
    /// Armed breakout auto-close timers, cancelled by manual close
    pub breakout_timers: Arc<DashMap<MeetingId, JoinHandle<()>>>,
    pub started_at: Instant,
}

impl AppState {
    pub fn uptime_seconds(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}
