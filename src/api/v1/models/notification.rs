use bytes::Bytes;
use chrono::{DateTime, Utc};

use crate::database::notification;

#[derive(Debug, Clone, serde::Serialize)]
pub struct NotificationView {
    pub id: i64,
    pub business: i64,
    pub recipient: Option<i64>,
    pub notification_type: String,
    pub verb: String,
    pub data: serde_json::Value,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

impl From<&notification::Model> for NotificationView {
    fn from(model: &notification::Model) -> Self {
        Self {
            id: model.id,
            business: model.business_id,
            recipient: model.recipient_id,
            notification_type: model.notification_type.to_string(),
            verb: model.verb.clone(),
            data: model.data.clone(),
            is_read: model.is_read,
            created_at: model.created_at,
        }
    }
}

impl NotificationView {
    /// The frame pushed over notification sockets.
    pub fn into_frame(self) -> Bytes {
        serde_json::json!({
            "type": "notification",
            "notification": self,
        })
        .to_string()
        .into()
    }
}
