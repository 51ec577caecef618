use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;

use crate::database::{
    activity, business, chat_message, notification, user, Datastore, DatastoreError,
    NewActivity, NewNotification,
};

#[derive(Default)]
struct Inner {
    businesses: HashMap<i64, business::Model>,
    users: HashMap<i64, user::Model>,
    notifications: Vec<notification::Model>,
    activities: Vec<activity::Model>,
    chat_messages: Vec<chat_message::Model>,
    next_id: i64,
}

impl Inner {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

/// In-memory [`Datastore`] for the test harness. Writes can be made to
/// fail on demand to exercise the persistence failure paths.
#[derive(Default)]
pub struct MemoryDatastore {
    inner: Mutex<Inner>,
    fail_writes: AtomicBool,
}

impl MemoryDatastore {
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn check_writable(&self) -> Result<(), DatastoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            Err(DatastoreError::Unavailable("injected write failure".into()))
        } else {
            Ok(())
        }
    }

    pub fn seed_business(&self, name: &str) -> business::Model {
        let mut inner = self.inner.lock().unwrap();
        let model = business::Model {
            id: inner.next_id(),
            name: name.to_string(),
            is_active: true,
            created_at: Utc::now(),
        };
        inner.businesses.insert(model.id, model.clone());
        model
    }

    pub fn seed_user(
        &self,
        business_id: Option<i64>,
        email: &str,
        role: user::Role,
    ) -> user::Model {
        let mut inner = self.inner.lock().unwrap();
        let model = user::Model {
            id: inner.next_id(),
            business_id,
            email: email.to_string(),
            role,
            is_superuser: false,
            is_active: true,
            created_at: Utc::now(),
        };
        inner.users.insert(model.id, model.clone());
        model
    }

    pub fn seed_superuser(&self, email: &str) -> user::Model {
        let mut inner = self.inner.lock().unwrap();
        let model = user::Model {
            id: inner.next_id(),
            business_id: None,
            email: email.to_string(),
            role: user::Role::Owner,
            is_superuser: true,
            is_active: true,
            created_at: Utc::now(),
        };
        inner.users.insert(model.id, model.clone());
        model
    }

    pub fn deactivate_user(&self, id: i64) {
        let mut inner = self.inner.lock().unwrap();
        if let Some(user) = inner.users.get_mut(&id) {
            user.is_active = false;
        }
    }

    pub fn chat_message_count(&self) -> usize {
        self.inner.lock().unwrap().chat_messages.len()
    }

    pub fn activity_count(&self) -> usize {
        self.inner.lock().unwrap().activities.len()
    }

    pub fn last_chat_message(&self) -> Option<chat_message::Model> {
        self.inner.lock().unwrap().chat_messages.last().cloned()
    }

    fn visible_to(notification: &notification::Model, user: &user::Model) -> bool {
        match notification.recipient_id {
            Some(recipient_id) => recipient_id == user.id,
            None => user.business_id == Some(notification.business_id),
        }
    }
}

#[async_trait]
impl Datastore for MemoryDatastore {
    async fn user_by_id(&self, id: i64) -> Result<Option<user::Model>, DatastoreError> {
        Ok(self.inner.lock().unwrap().users.get(&id).cloned())
    }

    async fn business_by_id(&self, id: i64) -> Result<Option<business::Model>, DatastoreError> {
        Ok(self.inner.lock().unwrap().businesses.get(&id).cloned())
    }

    async fn users_by_business(
        &self,
        business_id: i64,
    ) -> Result<Vec<user::Model>, DatastoreError> {
        let inner = self.inner.lock().unwrap();
        let mut users = inner
            .users
            .values()
            .filter(|user| user.business_id == Some(business_id))
            .cloned()
            .collect::<Vec<_>>();
        users.sort_by_key(|user| user.id);
        Ok(users)
    }

    async fn users_by_ids(&self, ids: &[i64]) -> Result<Vec<user::Model>, DatastoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(ids
            .iter()
            .filter_map(|id| inner.users.get(id).cloned())
            .collect())
    }

    async fn create_notification(
        &self,
        input: NewNotification,
    ) -> Result<notification::Model, DatastoreError> {
        self.check_writable()?;
        let mut inner = self.inner.lock().unwrap();
        let model = notification::Model {
            id: inner.next_id(),
            business_id: input.business_id,
            recipient_id: input.recipient_id,
            notification_type: input.notification_type,
            verb: input.verb,
            data: input.data,
            is_read: false,
            created_at: Utc::now(),
        };
        inner.notifications.push(model.clone());
        Ok(model)
    }

    async fn notification_by_id(
        &self,
        id: i64,
    ) -> Result<Option<notification::Model>, DatastoreError> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .notifications
            .iter()
            .find(|notification| notification.id == id)
            .cloned())
    }

    async fn notifications_for_user(
        &self,
        user: &user::Model,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<notification::Model>, DatastoreError> {
        let inner = self.inner.lock().unwrap();
        let mut visible = inner
            .notifications
            .iter()
            .filter(|notification| Self::visible_to(notification, user))
            .cloned()
            .collect::<Vec<_>>();
        visible.sort_by(|a, b| b.id.cmp(&a.id));
        Ok(visible
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .collect())
    }

    async fn unread_notification_count(
        &self,
        user: &user::Model,
    ) -> Result<i64, DatastoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .notifications
            .iter()
            .filter(|notification| !notification.is_read && Self::visible_to(notification, user))
            .count() as i64)
    }

    async fn set_notification_read(&self, id: i64) -> Result<(), DatastoreError> {
        self.check_writable()?;
        let mut inner = self.inner.lock().unwrap();
        if let Some(notification) = inner
            .notifications
            .iter_mut()
            .find(|notification| notification.id == id)
        {
            notification.is_read = true;
        }
        Ok(())
    }

    async fn set_all_notifications_read(
        &self,
        user: &user::Model,
    ) -> Result<u64, DatastoreError> {
        self.check_writable()?;
        let user = user.clone();
        let mut inner = self.inner.lock().unwrap();
        let mut updated = 0;
        for notification in inner.notifications.iter_mut() {
            if !notification.is_read && Self::visible_to(notification, &user) {
                notification.is_read = true;
                updated += 1;
            }
        }
        Ok(updated)
    }

    async fn create_activity(
        &self,
        input: NewActivity,
    ) -> Result<activity::Model, DatastoreError> {
        self.check_writable()?;
        let mut inner = self.inner.lock().unwrap();
        let model = activity::Model {
            id: inner.next_id(),
            business_id: input.business_id,
            actor_id: input.actor_id,
            action_type: input.action_type,
            model_name: input.model_name,
            object_id: input.object_id,
            before: input.before,
            after: input.after,
            timestamp: Utc::now(),
        };
        inner.activities.push(model.clone());
        Ok(model)
    }

    async fn activities_by_business(
        &self,
        business_id: i64,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<activity::Model>, DatastoreError> {
        let inner = self.inner.lock().unwrap();
        let mut activities = inner
            .activities
            .iter()
            .filter(|activity| activity.business_id == business_id)
            .cloned()
            .collect::<Vec<_>>();
        activities.sort_by(|a, b| b.id.cmp(&a.id));
        Ok(activities
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .collect())
    }

    async fn create_chat_message(
        &self,
        business_id: i64,
        sender_id: i64,
        content: &str,
    ) -> Result<chat_message::Model, DatastoreError> {
        self.check_writable()?;
        let mut inner = self.inner.lock().unwrap();
        let model = chat_message::Model {
            id: inner.next_id(),
            business_id,
            sender_id,
            content: content.to_string(),
            created_at: Utc::now(),
        };
        inner.chat_messages.push(model.clone());
        Ok(model)
    }

    async fn chat_messages_by_business(
        &self,
        business_id: i64,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<chat_message::Model>, DatastoreError> {
        let inner = self.inner.lock().unwrap();
        let mut messages = inner
            .chat_messages
            .iter()
            .filter(|message| message.business_id == business_id)
            .cloned()
            .collect::<Vec<_>>();
        messages.sort_by(|a, b| b.id.cmp(&a.id));
        Ok(messages
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .collect())
    }
}
