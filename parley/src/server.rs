//! Server lifecycle.
//!
//! Boot order: database (with migrations) -> media worker pool -> services
//! -> reminder scheduler -> HTTP/WebSocket listener. Shutdown mirrors it:
//! stop accepting, stop the scheduler, close every room (which closes every
//! peer), drop the workers, disconnect the database.

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{error, info};

use parley_api::hub::BroadcastHub;
use parley_api::rtc::RoomRegistry;
use parley_api::state::AppState;
use parley_core::repository::{
    BreakoutRepository, ChatRepository, InvitationRepository, MeetingRepository,
    ParticipantRepository, QuestionRepository, ReminderRepository, UserRepository,
};
use parley_core::service::{
    AdmissionService, AuthVerifier, EmailService, RateLimiter, ReminderScheduler,
    TurnCredentialService,
};
use parley_core::Config;
use parley_sfu::{SfuConfig, WorkerPool};

pub async fn run(config: Config) -> anyhow::Result<()> {
    let pool = init_database(&config).await?;

    info!("Running database migrations...");
    sqlx::migrate!("../migrations").run(&pool).await?;
    info!("Migrations completed");

    let workers = WorkerPool::new(SfuConfig {
        listen_ip: config.webrtc.listen_ip.clone(),
        announced_ip: config.webrtc.announced_ip.clone(),
        rtc_min_port: config.webrtc.rtc_min_port,
        rtc_max_port: config.webrtc.rtc_max_port,
        num_workers: config.webrtc.num_workers,
        max_incoming_bitrate: config.webrtc.max_incoming_bitrate,
    })
    .await?;

    let meetings = MeetingRepository::new(pool.clone());
    let participants = ParticipantRepository::new(pool.clone());
    let users = UserRepository::new(pool.clone());
    let reminders = ReminderRepository::new(pool.clone());

    let admission = AdmissionService::new(meetings.clone(), participants.clone(), users);
    let email = EmailService::new(&config.email)?;
    let hub = Arc::new(BroadcastHub::new());
    let rooms = Arc::new(RoomRegistry::new(Arc::clone(&workers)));

    let state = AppState {
        verifier: AuthVerifier::new(&config.auth.secret)?,
        admission,
        chats: ChatRepository::new(pool.clone()),
        questions: QuestionRepository::new(pool.clone()),
        breakout_rooms: BreakoutRepository::new(pool.clone()),
        invitations: InvitationRepository::new(pool.clone()),
        email: email.clone(),
        turn: TurnCredentialService::new(config.turn.clone()),
        limiter: RateLimiter::new(),
        hub: Arc::clone(&hub),
        rooms: Arc::clone(&rooms),
        workers: Arc::clone(&workers),
        breakout_timers: Arc::new(dashmap::DashMap::new()),
        started_at: Instant::now(),
        config: Arc::new(config.clone()),
    };

    let scheduler = ReminderScheduler::new(
        reminders,
        meetings,
        participants,
        email,
        Arc::clone(&hub) as Arc<dyn parley_core::service::ReminderSink>,
    )
    .spawn();

    let router = parley_api::http::create_router(state);
    let address = config.http_address();
    let listener = tokio::net::TcpListener::bind(&address).await?;
    info!(address = %address, "Listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Shutting down...");
    scheduler.abort();
    rooms.close_all();
    drop(workers);
    pool.close().await;
    info!("Shutdown complete");

    Ok(())
}

async fn init_database(config: &Config) -> anyhow::Result<PgPool> {
    info!("Connecting to database...");
    let pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .min_connections(config.database.min_connections)
        .acquire_timeout(Duration::from_secs(config.database.connect_timeout_seconds))
        .idle_timeout(Duration::from_secs(config.database.idle_timeout_seconds))
        .connect(config.database_url())
        .await?;
    info!("Database connected");
    Ok(pool)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to install SIGINT handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => error!(error = %e, "Failed to install SIGTERM handler"),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("Received SIGINT"),
        () = terminate => info!("Received SIGTERM"),
    }
}
