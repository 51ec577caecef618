use serde_json::json;

use super::{connect, connect_expecting_rejection, recv_json, send_json, wait_for_subscribers};
use crate::database::activity::ActionType;
use crate::recorder::{self, ActivityInput};
use crate::subscription::SubscriptionTopic;
use crate::tests::global::{access_token, mock_server};

#[tokio::test]
async fn test_activity_is_pushed_to_the_feed() {
    let (t, addr) = mock_server().await;
    let business = t.db.seed_business("acme");
    let member = t.db.seed_user(Some(business.id), "m@acme.test", Default::default());
    let actor = t.db.seed_user(
        Some(business.id),
        "owner@acme.test",
        crate::database::user::Role::Owner,
    );

    let mut ws = connect(
        addr,
        &format!(
            "/v1/ws/business/{}/activity?token={}",
            business.id,
            access_token(&t.global, member.id)
        ),
    )
    .await;

    wait_for_subscribers(&t.global, SubscriptionTopic::BusinessActivity(business.id), 1).await;

    recorder::log_activity(
        &t.global,
        ActivityInput {
            business_id: business.id,
            actor: Some(&actor),
            action_type: ActionType::Update,
            model_name: "expense".to_string(),
            object_id: "12".to_string(),
            before: Some(json!({ "amount": 100 })),
            after: Some(json!({ "amount": 150 })),
        },
    )
    .await
    .unwrap()
    .expect("activity should be recorded");

    let frame = recv_json(&mut ws).await;
    assert_eq!(frame["type"], "activity");
    assert_eq!(frame["activity"]["business"], business.id);
    assert_eq!(frame["activity"]["action_type"], "update");
    assert_eq!(frame["activity"]["model_name"], "expense");
    assert_eq!(frame["activity"]["actor"]["role"], "owner");
    assert_eq!(frame["activity"]["before"]["amount"], 100);
    assert_eq!(frame["activity"]["after"]["amount"], 150);
}

#[tokio::test]
async fn test_cross_business_connection_is_rejected() {
    let (t, addr) = mock_server().await;
    let home = t.db.seed_business("home");
    let other = t.db.seed_business("other");
    let member = t.db.seed_user(Some(home.id), "m@home.test", Default::default());

    let status = connect_expecting_rejection(
        addr,
        &format!(
            "/v1/ws/business/{}/activity?token={}",
            other.id,
            access_token(&t.global, member.id)
        ),
    )
    .await;
    assert_eq!(status, 403);
}

#[tokio::test]
async fn test_superuser_can_watch_any_feed() {
    let (t, addr) = mock_server().await;
    let business = t.db.seed_business("acme");
    let admin = t.db.seed_superuser("admin@ledgerstream.test");

    let mut ws = connect(
        addr,
        &format!(
            "/v1/ws/business/{}/activity?token={}",
            business.id,
            access_token(&t.global, admin.id)
        ),
    )
    .await;

    wait_for_subscribers(&t.global, SubscriptionTopic::BusinessActivity(business.id), 1).await;

    recorder::log_activity(
        &t.global,
        ActivityInput {
            business_id: business.id,
            actor: None,
            action_type: ActionType::Delete,
            model_name: "income".to_string(),
            object_id: "3".to_string(),
            before: Some(json!({ "amount": 20 })),
            after: None,
        },
    )
    .await
    .unwrap();

    let frame = recv_json(&mut ws).await;
    assert_eq!(frame["activity"]["action_type"], "delete");
    assert_eq!(frame["activity"]["actor"], serde_json::Value::Null);
}

#[tokio::test]
async fn test_inbound_frames_are_ignored() {
    let (t, addr) = mock_server().await;
    let business = t.db.seed_business("acme");
    let member = t.db.seed_user(Some(business.id), "m@acme.test", Default::default());

    let mut ws = connect(
        addr,
        &format!(
            "/v1/ws/business/{}/activity?token={}",
            business.id,
            access_token(&t.global, member.id)
        ),
    )
    .await;

    wait_for_subscribers(&t.global, SubscriptionTopic::BusinessActivity(business.id), 1).await;

    // The feed is push-only, whatever the client sends is discarded.
    send_json(&mut ws, json!({ "type": "message", "content": "hello?" })).await;

    recorder::log_activity(
        &t.global,
        ActivityInput {
            business_id: business.id,
            actor: None,
            action_type: ActionType::Create,
            model_name: "category".to_string(),
            object_id: "1".to_string(),
            before: None,
            after: Some(json!({ "name": "travel" })),
        },
    )
    .await
    .unwrap();

    let frame = recv_json(&mut ws).await;
    assert_eq!(frame["activity"]["model_name"], "category");
    assert_eq!(t.db.chat_message_count(), 0);
}
