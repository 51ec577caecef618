use chrono::{DateTime, Utc};

/// One message in the business-wide chat room. Messages are permanent.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Model {
    /// The unique identifier for the message.
    pub id: i64,
    /// The business chat room the message was posted in.
    pub business_id: i64,
    /// The user who sent the message.
    pub sender_id: i64,
    /// Message text, already trimmed.
    pub content: String,
    /// The time the message was created.
    pub created_at: DateTime<Utc>,
}
