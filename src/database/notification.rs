use chrono::{DateTime, Utc};

/// What kind of event a notification describes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum NotificationType {
    UserInvited,
    UserJoined,
    FinanceCreated,
    FinanceUpdated,
    #[default]
    Announcement,
    Activity,
    ChatMessage,
}

impl NotificationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UserInvited => "user_invited",
            Self::UserJoined => "user_joined",
            Self::FinanceCreated => "finance_created",
            Self::FinanceUpdated => "finance_updated",
            Self::Announcement => "announcement",
            Self::Activity => "activity",
            Self::ChatMessage => "chat_message",
        }
    }
}

impl std::fmt::Display for NotificationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for NotificationType {
    type Error = std::convert::Infallible;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Ok(match value.as_str() {
            "user_invited" => Self::UserInvited,
            "user_joined" => Self::UserJoined,
            "finance_created" => Self::FinanceCreated,
            "finance_updated" => Self::FinanceUpdated,
            "activity" => Self::Activity,
            "chat_message" => Self::ChatMessage,
            _ => Self::Announcement,
        })
    }
}

/// A notification. A null recipient means it is a broadcast to the whole
/// business. Rows are kept forever and only ever mutated by the read
/// flag.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Model {
    /// The unique identifier for the notification.
    pub id: i64,
    /// The business the notification belongs to.
    pub business_id: i64,
    /// Addressed recipient, null for business-wide broadcasts.
    pub recipient_id: Option<i64>,
    #[sqlx(try_from = "String")]
    pub notification_type: NotificationType,
    /// Human readable description of what happened.
    pub verb: String,
    /// Arbitrary structured payload.
    pub data: serde_json::Value,
    pub is_read: bool,
    /// The time the notification was created.
    pub created_at: DateTime<Utc>,
}
