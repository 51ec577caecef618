use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;

use crate::global::GlobalState;
use crate::store::{KeyValueStore, StoreError};
use crate::subscription::SubscriptionTopic;

/// Retention for the tracked-key list itself. Stale registrations expire
/// on their own even if no invalidation ever runs for the business.
pub const REGISTRY_TTL: Duration = Duration::from_secs(3600);

fn registry_key(business_id: i64) -> String {
    format!("dashboard_keys:{business_id}")
}

async fn tracked_keys(
    global: &Arc<GlobalState>,
    business_id: i64,
) -> Result<Vec<String>, StoreError> {
    Ok(global
        .kv
        .get(&registry_key(business_id))
        .await?
        .and_then(|raw| serde_json::from_str(&raw).ok())
        .unwrap_or_default())
}

/// Track a dashboard cache key for later invalidation. Duplicate
/// registrations are collapsed.
pub async fn register_key(
    global: &Arc<GlobalState>,
    business_id: i64,
    cache_key: &str,
) -> Result<(), StoreError> {
    let mut keys = tracked_keys(global, business_id).await?;

    if !keys.iter().any(|key| key == cache_key) {
        keys.push(cache_key.to_string());
    }

    let raw = serde_json::to_string(&keys).expect("failed to serialize key list");
    global
        .kv
        .set(&registry_key(business_id), &raw, Some(REGISTRY_TTL))
        .await
}

/// Drop every cached dashboard payload for the business and tell
/// connected dashboards to refetch.
///
/// Key deletion is best-effort per key: one failing delete does not stop
/// the rest. The push to the business notification group is best-effort
/// as well, correctness only depends on the keys being gone.
pub async fn invalidate(global: &Arc<GlobalState>, business_id: i64) -> Result<(), StoreError> {
    let keys = tracked_keys(global, business_id).await?;

    for key in &keys {
        if let Err(e) = global.kv.del(key).await {
            tracing::warn!(key = %key, error = %e, "failed to delete dashboard cache key");
        }
    }

    global.kv.del(&registry_key(business_id)).await?;

    global.subscriber.publish(
        SubscriptionTopic::BusinessNotifications(business_id),
        Bytes::from_static(br#"{"action":"invalidate"}"#),
    );

    Ok(())
}
