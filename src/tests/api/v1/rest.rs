use hyper::{Method, StatusCode};
use serde_json::json;

use crate::database::notification::NotificationType;
use crate::presence;
use crate::recorder;
use crate::tests::api::http_request;
use crate::tests::global::{access_token, mock_server};

#[tokio::test]
async fn test_health() {
    let (_t, addr) = mock_server().await;

    let (status, body) = http_request(addr, Method::GET, "/v1/health", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_unknown_route_is_not_found() {
    let (_t, addr) = mock_server().await;

    let (status, _) = http_request(addr, Method::GET, "/v1/nope", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_notifications_require_auth() {
    let (_t, addr) = mock_server().await;

    let (status, _) = http_request(addr, Method::GET, "/v1/notifications", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) =
        http_request(addr, Method::GET, "/v1/notifications", Some("garbage"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_notification_read_flow() {
    let (t, addr) = mock_server().await;
    let business = t.db.seed_business("acme");
    let mona = t.db.seed_user(Some(business.id), "mona@acme.test", Default::default());
    let token = access_token(&t.global, mona.id);

    recorder::send_business_notification(
        &t.global,
        business.id,
        "broadcast",
        NotificationType::Announcement,
        None,
        None,
    )
    .await
    .unwrap();
    let targeted = recorder::send_business_notification(
        &t.global,
        business.id,
        "targeted",
        NotificationType::UserInvited,
        None,
        Some(&mona),
    )
    .await
    .unwrap();

    let (status, body) =
        http_request(addr, Method::GET, "/v1/notifications", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["results"].as_array().unwrap().len(), 2);
    // Newest first.
    assert_eq!(body["results"][0]["verb"], "targeted");

    let (status, body) = http_request(
        addr,
        Method::GET,
        "/v1/notifications/unread_count",
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["unread"], 2);

    let (status, _) = http_request(
        addr,
        Method::POST,
        &format!("/v1/notifications/{}/mark_read", targeted.id),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = http_request(
        addr,
        Method::GET,
        "/v1/notifications/unread_count",
        Some(&token),
        None,
    )
    .await;
    assert_eq!(body["unread"], 1);

    let (status, body) = http_request(
        addr,
        Method::POST,
        "/v1/notifications/mark_all_read",
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["updated"], 1);

    let (_, body) = http_request(
        addr,
        Method::GET,
        "/v1/notifications/unread_count",
        Some(&token),
        None,
    )
    .await;
    assert_eq!(body["unread"], 0);
}

#[tokio::test]
async fn test_foreign_targeted_notification_cannot_be_marked_read() {
    let (t, addr) = mock_server().await;
    let business = t.db.seed_business("acme");
    let mona = t.db.seed_user(Some(business.id), "mona@acme.test", Default::default());
    let nick = t.db.seed_user(Some(business.id), "nick@acme.test", Default::default());

    let targeted = recorder::send_business_notification(
        &t.global,
        business.id,
        "for nick",
        NotificationType::Announcement,
        None,
        Some(&nick),
    )
    .await
    .unwrap();

    let (status, _) = http_request(
        addr,
        Method::POST,
        &format!("/v1/notifications/{}/mark_read", targeted.id),
        Some(&access_token(&t.global, mona.id)),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_activity_feed_is_business_scoped() {
    let (t, addr) = mock_server().await;
    let business = t.db.seed_business("acme");
    let other = t.db.seed_business("umbrella");
    let mona = t.db.seed_user(Some(business.id), "mona@acme.test", Default::default());

    recorder::log_activity(
        &t.global,
        recorder::ActivityInput {
            business_id: business.id,
            actor: Some(&mona),
            action_type: crate::database::activity::ActionType::Create,
            model_name: "project".to_string(),
            object_id: "1".to_string(),
            before: None,
            after: Some(json!({ "name": "relaunch" })),
        },
    )
    .await
    .unwrap();

    let token = access_token(&t.global, mona.id);

    let (status, body) = http_request(
        addr,
        Method::GET,
        &format!("/v1/business/{}/activity", business.id),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let results = body["results"].as_array().unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0]["actor"]["email"], "mona@acme.test");

    // The other tenant's feed is off limits.
    let (status, _) = http_request(
        addr,
        Method::GET,
        &format!("/v1/business/{}/activity", other.id),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_chat_history_and_rest_create() {
    let (t, addr) = mock_server().await;
    let business = t.db.seed_business("acme");
    let mona = t.db.seed_user(Some(business.id), "mona@acme.test", Default::default());
    let token = access_token(&t.global, mona.id);

    let (status, body) = http_request(
        addr,
        Method::POST,
        &format!("/v1/business/{}/chat/messages", business.id),
        Some(&token),
        Some(json!({ "content": "  hey there  " })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["content"], "hey there");
    assert_eq!(body["sender"]["id"], mona.id);

    let (status, body) = http_request(
        addr,
        Method::GET,
        &format!("/v1/business/{}/chat/messages", business.id),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let results = body["results"].as_array().unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0]["content"], "hey there");
}

#[tokio::test]
async fn test_empty_rest_chat_message_is_rejected() {
    let (t, addr) = mock_server().await;
    let business = t.db.seed_business("acme");
    let mona = t.db.seed_user(Some(business.id), "mona@acme.test", Default::default());

    let (status, _) = http_request(
        addr,
        Method::POST,
        &format!("/v1/business/{}/chat/messages", business.id),
        Some(&access_token(&t.global, mona.id)),
        Some(json!({ "content": "   " })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(t.db.chat_message_count(), 0);
}

#[tokio::test]
async fn test_rest_chat_create_requires_membership() {
    let (t, addr) = mock_server().await;
    let business = t.db.seed_business("acme");
    let other = t.db.seed_business("umbrella");
    let mona = t.db.seed_user(Some(business.id), "mona@acme.test", Default::default());

    let (status, _) = http_request(
        addr,
        Method::POST,
        &format!("/v1/business/{}/chat/messages", other.id),
        Some(&access_token(&t.global, mona.id)),
        Some(json!({ "content": "intruder" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(t.db.chat_message_count(), 0);
}

#[tokio::test]
async fn test_online_users_listing() {
    let (t, addr) = mock_server().await;
    let business = t.db.seed_business("acme");
    let mona = t.db.seed_user(Some(business.id), "mona@acme.test", Default::default());
    let nick = t.db.seed_user(Some(business.id), "nick@acme.test", Default::default());

    presence::mark_online(&t.global, nick.id, Some(business.id))
        .await
        .unwrap();

    let (status, body) = http_request(
        addr,
        Method::GET,
        &format!("/v1/business/{}/online_users", business.id),
        Some(&access_token(&t.global, mona.id)),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let results = body["results"].as_array().unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0]["id"], nick.id);
    assert_eq!(results[0]["email"], "nick@acme.test");
}
