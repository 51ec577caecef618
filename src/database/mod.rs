use async_trait::async_trait;

pub mod activity;
pub mod business;
pub mod chat_message;
pub mod notification;
pub mod postgres;
pub mod user;

pub use postgres::PgDatastore;

#[derive(thiserror::Error, Debug)]
pub enum DatastoreError {
    #[error("database error: {0}")]
    Sql(#[from] sqlx::Error),
    #[error("datastore unavailable: {0}")]
    Unavailable(String),
}

/// Input for a new notification row.
#[derive(Debug, Clone)]
pub struct NewNotification {
    pub business_id: i64,
    pub recipient_id: Option<i64>,
    pub notification_type: notification::NotificationType,
    pub verb: String,
    pub data: serde_json::Value,
}

/// Input for a new audit entry.
#[derive(Debug, Clone)]
pub struct NewActivity {
    pub business_id: i64,
    pub actor_id: Option<i64>,
    pub action_type: activity::ActionType,
    pub model_name: String,
    pub object_id: String,
    pub before: Option<serde_json::Value>,
    pub after: Option<serde_json::Value>,
}

/// Durable persistence consumed by the realtime core.
///
/// The REST collaborators own the full CRUD surface; this trait carries
/// only what the recorder, gateway and read endpoints need. Production
/// runs on [`PgDatastore`], the test harness swaps in an in-memory
/// implementation.
#[async_trait]
pub trait Datastore: Send + Sync + 'static {
    async fn user_by_id(&self, id: i64) -> Result<Option<user::Model>, DatastoreError>;

    async fn business_by_id(&self, id: i64) -> Result<Option<business::Model>, DatastoreError>;

    /// Every user belonging to the business, active or not.
    async fn users_by_business(&self, business_id: i64)
        -> Result<Vec<user::Model>, DatastoreError>;

    /// Batch lookup used to decorate feeds with actor details.
    async fn users_by_ids(&self, ids: &[i64]) -> Result<Vec<user::Model>, DatastoreError>;

    async fn create_notification(
        &self,
        input: NewNotification,
    ) -> Result<notification::Model, DatastoreError>;

    async fn notification_by_id(
        &self,
        id: i64,
    ) -> Result<Option<notification::Model>, DatastoreError>;

    /// Notifications addressed to the user plus broadcasts for its
    /// business, newest first.
    async fn notifications_for_user(
        &self,
        user: &user::Model,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<notification::Model>, DatastoreError>;

    async fn unread_notification_count(&self, user: &user::Model)
        -> Result<i64, DatastoreError>;

    async fn set_notification_read(&self, id: i64) -> Result<(), DatastoreError>;

    async fn set_all_notifications_read(&self, user: &user::Model)
        -> Result<u64, DatastoreError>;

    async fn create_activity(&self, input: NewActivity)
        -> Result<activity::Model, DatastoreError>;

    async fn activities_by_business(
        &self,
        business_id: i64,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<activity::Model>, DatastoreError>;

    /// Content must already be validated and trimmed by the caller.
    async fn create_chat_message(
        &self,
        business_id: i64,
        sender_id: i64,
        content: &str,
    ) -> Result<chat_message::Model, DatastoreError>;

    async fn chat_messages_by_business(
        &self,
        business_id: i64,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<chat_message::Model>, DatastoreError>;
}
