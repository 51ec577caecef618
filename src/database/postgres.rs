use async_trait::async_trait;

use super::{
    activity, business, chat_message, notification, user, Datastore, DatastoreError,
    NewActivity, NewNotification,
};

/// Postgres implementation of [`Datastore`].
pub struct PgDatastore {
    pool: sqlx::PgPool,
}

impl PgDatastore {
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Datastore for PgDatastore {
    async fn user_by_id(&self, id: i64) -> Result<Option<user::Model>, DatastoreError> {
        Ok(
            sqlx::query_as::<_, user::Model>("SELECT * FROM users WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?,
        )
    }

    async fn business_by_id(&self, id: i64) -> Result<Option<business::Model>, DatastoreError> {
        Ok(
            sqlx::query_as::<_, business::Model>("SELECT * FROM businesses WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?,
        )
    }

    async fn users_by_business(
        &self,
        business_id: i64,
    ) -> Result<Vec<user::Model>, DatastoreError> {
        Ok(sqlx::query_as::<_, user::Model>(
            "SELECT * FROM users WHERE business_id = $1 ORDER BY id",
        )
        .bind(business_id)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn users_by_ids(&self, ids: &[i64]) -> Result<Vec<user::Model>, DatastoreError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        Ok(
            sqlx::query_as::<_, user::Model>("SELECT * FROM users WHERE id = ANY($1)")
                .bind(ids.to_vec())
                .fetch_all(&self.pool)
                .await?,
        )
    }

    async fn create_notification(
        &self,
        input: NewNotification,
    ) -> Result<notification::Model, DatastoreError> {
        Ok(sqlx::query_as::<_, notification::Model>(
            "INSERT INTO notifications (business_id, recipient_id, notification_type, verb, data) \
             VALUES ($1, $2, $3, $4, $5) RETURNING *",
        )
        .bind(input.business_id)
        .bind(input.recipient_id)
        .bind(input.notification_type.as_str())
        .bind(&input.verb)
        .bind(&input.data)
        .fetch_one(&self.pool)
        .await?)
    }

    async fn notification_by_id(
        &self,
        id: i64,
    ) -> Result<Option<notification::Model>, DatastoreError> {
        Ok(
            sqlx::query_as::<_, notification::Model>("SELECT * FROM notifications WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?,
        )
    }

    async fn notifications_for_user(
        &self,
        user: &user::Model,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<notification::Model>, DatastoreError> {
        Ok(sqlx::query_as::<_, notification::Model>(
            "SELECT * FROM notifications \
             WHERE recipient_id = $1 OR (recipient_id IS NULL AND business_id = $2) \
             ORDER BY created_at DESC, id DESC LIMIT $3 OFFSET $4",
        )
        .bind(user.id)
        .bind(user.business_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn unread_notification_count(
        &self,
        user: &user::Model,
    ) -> Result<i64, DatastoreError> {
        Ok(sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM notifications \
             WHERE NOT is_read AND (recipient_id = $1 OR (recipient_id IS NULL AND business_id = $2))",
        )
        .bind(user.id)
        .bind(user.business_id)
        .fetch_one(&self.pool)
        .await?)
    }

    async fn set_notification_read(&self, id: i64) -> Result<(), DatastoreError> {
        sqlx::query("UPDATE notifications SET is_read = TRUE WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn set_all_notifications_read(
        &self,
        user: &user::Model,
    ) -> Result<u64, DatastoreError> {
        let result = sqlx::query(
            "UPDATE notifications SET is_read = TRUE \
             WHERE NOT is_read AND (recipient_id = $1 OR (recipient_id IS NULL AND business_id = $2))",
        )
        .bind(user.id)
        .bind(user.business_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    async fn create_activity(
        &self,
        input: NewActivity,
    ) -> Result<activity::Model, DatastoreError> {
        Ok(sqlx::query_as::<_, activity::Model>(
            "INSERT INTO activities (business_id, actor_id, action_type, model_name, object_id, before, after) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING *",
        )
        .bind(input.business_id)
        .bind(input.actor_id)
        .bind(input.action_type.as_str())
        .bind(&input.model_name)
        .bind(&input.object_id)
        .bind(&input.before)
        .bind(&input.after)
        .fetch_one(&self.pool)
        .await?)
    }

    async fn activities_by_business(
        &self,
        business_id: i64,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<activity::Model>, DatastoreError> {
        Ok(sqlx::query_as::<_, activity::Model>(
            "SELECT * FROM activities WHERE business_id = $1 \
             ORDER BY timestamp DESC, id DESC LIMIT $2 OFFSET $3",
        )
        .bind(business_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn create_chat_message(
        &self,
        business_id: i64,
        sender_id: i64,
        content: &str,
    ) -> Result<chat_message::Model, DatastoreError> {
        Ok(sqlx::query_as::<_, chat_message::Model>(
            "INSERT INTO chat_messages (business_id, sender_id, content) \
             VALUES ($1, $2, $3) RETURNING *",
        )
        .bind(business_id)
        .bind(sender_id)
        .bind(content)
        .fetch_one(&self.pool)
        .await?)
    }

    async fn chat_messages_by_business(
        &self,
        business_id: i64,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<chat_message::Model>, DatastoreError> {
        Ok(sqlx::query_as::<_, chat_message::Model>(
            "SELECT * FROM chat_messages WHERE business_id = $1 \
             ORDER BY created_at DESC, id DESC LIMIT $2 OFFSET $3",
        )
        .bind(business_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?)
    }
}
