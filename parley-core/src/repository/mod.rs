pub mod breakout;
pub mod chat;
pub mod invitation;
pub mod meeting;
pub mod participant;
pub mod question;
pub mod reminder;
pub mod user;

pub use breakout::BreakoutRepository;
pub use chat::ChatRepository;
pub use invitation::InvitationRepository;
pub use meeting::MeetingRepository;
pub use participant::ParticipantRepository;
pub use question::QuestionRepository;
pub use reminder::{DueReminder, ReminderRepository};
pub use user::UserRepository;
