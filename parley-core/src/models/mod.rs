pub mod breakout;
pub mod chat;
pub mod id;
pub mod invitation;
pub mod meeting;
pub mod participant;
pub mod question;
pub mod reminder;
pub mod user;

pub use breakout::BreakoutRoom;
pub use chat::{ChatMessage, ChatMessageWithSender, MAX_CHAT_CONTENT_LEN};
pub use id::{
    generate_id, generate_meeting_code, is_valid_meeting_code, BreakoutRoomId, ConnId, MeetingId,
    ParticipantId, QuestionId, ReminderId, UserId,
};
pub use invitation::Invitation;
pub use meeting::{Meeting, MeetingStatus};
pub use participant::{Participant, ParticipantStatus, ParticipantWithUser, Role};
pub use question::{Question, UpvoteResult, MAX_QUESTION_CONTENT_LEN};
pub use reminder::{Reminder, ReminderKind};
pub use user::User;
