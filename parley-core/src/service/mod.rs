pub mod admission;
pub mod auth;
pub mod email;
pub mod rate_limit;
pub mod reminder;
pub mod turn;

pub use admission::{AdmissionService, JoinOutcome};
pub use auth::{AuthVerifier, Claims};
pub use email::EmailService;
pub use rate_limit::{RateCategory, RateLimiter};
pub use reminder::{ReminderEvent, ReminderScheduler, ReminderSink};
pub use turn::{TurnCredentialService, TurnCredentials};
