use bytes::Bytes;
use chrono::{DateTime, Utc};

use super::user::UserView;
use crate::database::{activity, user};

#[derive(Debug, Clone, serde::Serialize)]
pub struct ActivityView {
    pub id: i64,
    pub business: i64,
    pub actor: Option<UserView>,
    pub action_type: String,
    pub model_name: String,
    pub object_id: String,
    pub before: Option<serde_json::Value>,
    pub after: Option<serde_json::Value>,
    pub timestamp: DateTime<Utc>,
}

impl ActivityView {
    pub fn new(model: &activity::Model, actor: Option<&user::Model>) -> Self {
        Self {
            id: model.id,
            business: model.business_id,
            actor: actor.map(UserView::from),
            action_type: model.action_type.to_string(),
            model_name: model.model_name.clone(),
            object_id: model.object_id.clone(),
            before: model.before.clone(),
            after: model.after.clone(),
            timestamp: model.timestamp,
        }
    }

    /// The frame pushed over activity feed sockets.
    pub fn into_frame(self) -> Bytes {
        serde_json::json!({
            "type": "activity",
            "activity": self,
        })
        .to_string()
        .into()
    }
}
