use bytes::Bytes;
use chrono::{DateTime, Utc};

use super::user::UserView;
use crate::database::{chat_message, user};

#[derive(Debug, Clone, serde::Serialize)]
pub struct ChatMessageView {
    pub id: i64,
    pub business: i64,
    pub sender: UserView,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl ChatMessageView {
    pub fn new(model: &chat_message::Model, sender: &user::Model) -> Self {
        Self {
            id: model.id,
            business: model.business_id,
            sender: UserView::from(sender),
            content: model.content.clone(),
            created_at: model.created_at,
        }
    }

    /// The frame pushed over chat sockets.
    pub fn into_frame(self) -> Bytes {
        serde_json::json!({
            "type": "chat_message",
            "message": self,
        })
        .to_string()
        .into()
    }
}
