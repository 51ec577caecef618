use std::sync::Arc;

use crate::config::AppConfig;
use crate::context::Context;
use crate::database::Datastore;
use crate::store::KeyValueStore;
use crate::subscription::SubscriptionManager;

/// Process-wide state, constructed once in `main` (or by the test
/// harness) and handed to every component that needs it.
///
/// The datastore and key-value store are injected behind their contracts
/// so the same code runs against postgres/redis in production and the
/// in-memory implementations in tests.
pub struct GlobalState {
    pub config: AppConfig,
    pub ctx: Context,
    pub db: Arc<dyn Datastore>,
    pub kv: Arc<dyn KeyValueStore>,
    pub subscriber: SubscriptionManager,
}

impl GlobalState {
    pub fn new(
        config: AppConfig,
        ctx: Context,
        db: Arc<dyn Datastore>,
        kv: Arc<dyn KeyValueStore>,
    ) -> Self {
        Self {
            config,
            ctx,
            db,
            kv,
            subscriber: SubscriptionManager::default(),
        }
    }
}
