mod activity;
mod chat_message;
mod notification;
mod user;

pub use activity::ActivityView;
pub use chat_message::ChatMessageView;
pub use notification::NotificationView;
pub use user::UserView;
