use std::sync::Arc;
use std::time::Duration;

use crate::global::GlobalState;
use crate::store::{KeyValueStore, StoreError};

/// How long a liveness marker survives without a refresh. A connection
/// that vanishes without a close frame ages out within this window.
pub const PRESENCE_TTL: Duration = Duration::from_secs(120);

/// Presence keys are business-scoped so per-tenant online queries stay
/// unambiguous. Identities without a business fall back to an unscoped
/// key.
fn presence_key(user_id: i64, business_id: Option<i64>) -> String {
    match business_id {
        Some(business_id) => format!("presence:{business_id}:{user_id}"),
        None => format!("presence:{user_id}"),
    }
}

/// Mark a user online. Idempotent, repeated calls refresh the TTL.
pub async fn mark_online(
    global: &Arc<GlobalState>,
    user_id: i64,
    business_id: Option<i64>,
) -> Result<(), StoreError> {
    global
        .kv
        .set(&presence_key(user_id, business_id), "1", Some(PRESENCE_TTL))
        .await
}

/// Remove a user's liveness marker immediately (explicit disconnect).
pub async fn mark_offline(
    global: &Arc<GlobalState>,
    user_id: i64,
    business_id: Option<i64>,
) -> Result<(), StoreError> {
    global.kv.del(&presence_key(user_id, business_id)).await
}

/// Return the subset of `candidates` that are currently online for the
/// business. One batched store round trip regardless of candidate count.
pub async fn get_online_users(
    global: &Arc<GlobalState>,
    business_id: i64,
    candidates: &[i64],
) -> Result<Vec<i64>, StoreError> {
    let keys = candidates
        .iter()
        .map(|user_id| presence_key(*user_id, Some(business_id)))
        .collect::<Vec<_>>();

    let values = global.kv.get_many(&keys).await?;

    Ok(candidates
        .iter()
        .zip(values)
        .filter_map(|(user_id, value)| value.is_some().then_some(*user_id))
        .collect())
}
