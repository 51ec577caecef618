use std::sync::Arc;

use serde_json::Value;

use crate::api::v1::models::{ActivityView, ChatMessageView, NotificationView};
use crate::dashboard;
use crate::database::{
    activity::ActionType, chat_message, notification, notification::NotificationType, user,
    Datastore, DatastoreError, NewActivity, NewNotification,
};
use crate::global::GlobalState;
use crate::subscription::SubscriptionTopic;

pub const MAX_MESSAGE_LENGTH: usize = 500;

/// Models whose mutations make cached dashboard payloads stale.
const FINANCE_MODELS: &[&str] = &["expense", "income", "category"];

#[derive(thiserror::Error, Debug)]
pub enum RecorderError {
    #[error("datastore error: {0}")]
    Datastore(#[from] DatastoreError),
    #[error("message too long")]
    MessageTooLong,
}

/// Create a notification and push it to the right group.
///
/// The row is written first; only after the write succeeds is the event
/// handed to the broadcast bus, so a client that reads the history right
/// after the push always sees the row. A targeted notification goes to
/// the recipient's private group only, a broadcast goes to the business
/// group only.
pub async fn send_business_notification(
    global: &Arc<GlobalState>,
    business_id: i64,
    verb: &str,
    notification_type: NotificationType,
    data: Option<Value>,
    recipient: Option<&user::Model>,
) -> Result<notification::Model, RecorderError> {
    let model = global
        .db
        .create_notification(NewNotification {
            business_id,
            recipient_id: recipient.map(|r| r.id),
            notification_type,
            verb: verb.to_string(),
            data: normalize_snapshot(data.unwrap_or_else(|| Value::Object(Default::default()))),
        })
        .await?;

    let topic = match recipient {
        Some(recipient) => SubscriptionTopic::UserNotifications(recipient.id),
        None => SubscriptionTopic::BusinessNotifications(business_id),
    };

    global
        .subscriber
        .publish(topic, NotificationView::from(&model).into_frame());

    Ok(model)
}

/// Input for [`log_activity`].
pub struct ActivityInput<'a> {
    pub business_id: i64,
    pub actor: Option<&'a user::Model>,
    pub action_type: ActionType,
    pub model_name: String,
    pub object_id: String,
    pub before: Option<Value>,
    pub after: Option<Value>,
}

/// Record an audit entry and push it to the business activity feed.
///
/// Snapshots are normalized before anything else. An update whose
/// normalized snapshots are identical is not recorded at all and returns
/// `Ok(None)`. Persistence failures propagate without any event being
/// published.
pub async fn log_activity(
    global: &Arc<GlobalState>,
    input: ActivityInput<'_>,
) -> Result<Option<crate::database::activity::Model>, RecorderError> {
    let before = input.before.map(normalize_snapshot);
    let after = input.after.map(normalize_snapshot);

    if input.action_type == ActionType::Update && before.is_some() && before == after {
        tracing::debug!(
            model_name = %input.model_name,
            object_id = %input.object_id,
            "skipping no-op update activity"
        );
        return Ok(None);
    }

    let model = global
        .db
        .create_activity(NewActivity {
            business_id: input.business_id,
            actor_id: input.actor.map(|a| a.id),
            action_type: input.action_type,
            model_name: input.model_name,
            object_id: input.object_id,
            before,
            after,
        })
        .await?;

    global.subscriber.publish(
        SubscriptionTopic::BusinessActivity(model.business_id),
        ActivityView::new(&model, input.actor).into_frame(),
    );

    if FINANCE_MODELS.contains(&model.model_name.as_str()) {
        // Cache correctness only depends on the keys being dropped, so a
        // failing store never fails the mutation that was recorded.
        if let Err(e) = dashboard::invalidate(global, model.business_id).await {
            tracing::warn!(business_id = model.business_id, error = %e, "dashboard invalidation failed");
        }
    }

    Ok(Some(model))
}

/// Persist a chat message and push it to the business chat room.
///
/// Content is trimmed; an empty message is ignored and returns
/// `Ok(None)`.
pub async fn post_chat_message(
    global: &Arc<GlobalState>,
    business_id: i64,
    sender: &user::Model,
    content: &str,
) -> Result<Option<chat_message::Model>, RecorderError> {
    let content = content.trim();
    if content.is_empty() {
        return Ok(None);
    }

    if content.len() > MAX_MESSAGE_LENGTH {
        return Err(RecorderError::MessageTooLong);
    }

    let model = global
        .db
        .create_chat_message(business_id, sender.id, content)
        .await?;

    global.subscriber.publish(
        SubscriptionTopic::BusinessChat(business_id),
        ChatMessageView::new(&model, sender).into_frame(),
    );

    Ok(Some(model))
}

/// Normalize structured payloads to JSON-safe canonical form: monetary
/// values serialized as integral floats collapse to plain integers so
/// equal snapshots compare equal regardless of how the caller encoded
/// its numbers.
pub fn normalize_snapshot(value: Value) -> Value {
    match value {
        Value::Number(n) => {
            if n.is_f64() {
                let f = n.as_f64().unwrap_or(0.0);
                if f.fract() == 0.0 && f.abs() <= i64::MAX as f64 {
                    return Value::from(f as i64);
                }
            }
            Value::Number(n)
        }
        Value::Array(items) => Value::Array(items.into_iter().map(normalize_snapshot).collect()),
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(key, value)| (key, normalize_snapshot(value)))
                .collect(),
        ),
        other => other,
    }
}
