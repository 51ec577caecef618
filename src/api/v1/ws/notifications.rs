use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use hyper::{Body, Request, Response, StatusCode};
use hyper_tungstenite::tungstenite::Message;
use hyper_tungstenite::HyperWebsocket;
use serde_json::json;
use tokio::select;
use tokio::sync::broadcast::error::RecvError;

use super::{authenticate, forward, send_shutdown_close, WsSink};
use crate::api::error::{Result, ResultExt};
use crate::api::RequestGlobalExt;
use crate::database::{user, Datastore};
use crate::global::GlobalState;
use crate::subscription::SubscriptionTopic;

/// Inbound frames on the notification socket. Clients may acknowledge a
/// notification over the socket instead of the REST endpoint.
#[derive(serde::Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
enum ClientAction {
    MarkRead { id: i64 },
}

pub async fn handler(mut req: Request<Body>) -> Result<Response<Body>> {
    let global = req.get_global()?;

    let user = authenticate(&global, &req).await?;

    if !hyper_tungstenite::is_upgrade_request(&req) {
        return Err((StatusCode::BAD_REQUEST, "expected websocket upgrade").into());
    }

    let (response, websocket) = hyper_tungstenite::upgrade(&mut req, None)
        .extend_route((StatusCode::BAD_REQUEST, "failed to upgrade to websocket"))?;

    tokio::spawn(serve(global, websocket, user));

    Ok(response)
}

async fn serve(global: Arc<GlobalState>, websocket: HyperWebsocket, user: user::Model) {
    let websocket = match websocket.await {
        Ok(websocket) => websocket,
        Err(e) => {
            tracing::error!("failed to finish websocket upgrade: {}", e);
            return;
        }
    };

    let (mut tx, mut rx) = websocket.split();

    // Always the private per-user group; the business broadcast group
    // only when the user belongs to a business (a superuser without one
    // still gets targeted notifications).
    let mut user_events = match global
        .subscriber
        .subscribe(SubscriptionTopic::UserNotifications(user.id))
        .await
    {
        Ok(events) => events,
        Err(e) => {
            tracing::error!("failed to subscribe to notification events: {}", e);
            return;
        }
    };

    let mut business_events = match user.business_id {
        Some(business_id) => {
            match global
                .subscriber
                .subscribe(SubscriptionTopic::BusinessNotifications(business_id))
                .await
            {
                Ok(events) => Some(events),
                Err(e) => {
                    tracing::error!("failed to subscribe to notification events: {}", e);
                    return;
                }
            }
        }
        None => None,
    };

    loop {
        select! {
            msg = rx.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        handle_inbound(&global, &user, &mut tx, &text).await;
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        tracing::debug!("websocket receive error: {}", e);
                        break;
                    }
                }
            }
            event = user_events.recv() => {
                match event {
                    Ok(payload) => {
                        if !forward(&mut tx, &payload).await {
                            break;
                        }
                    }
                    Err(RecvError::Lagged(missed)) => {
                        tracing::warn!(user_id = user.id, missed, "notification subscriber lagging");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
            event = async {
                match business_events.as_mut() {
                    Some(events) => events.recv().await,
                    None => std::future::pending().await,
                }
            } => {
                match event {
                    Ok(payload) => {
                        if !forward(&mut tx, &payload).await {
                            break;
                        }
                    }
                    Err(RecvError::Lagged(missed)) => {
                        tracing::warn!(user_id = user.id, missed, "notification subscriber lagging");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
            _ = global.ctx.done() => {
                send_shutdown_close(&mut tx).await;
                break;
            }
        }
    }
}

async fn handle_inbound(
    global: &Arc<GlobalState>,
    user: &user::Model,
    tx: &mut WsSink,
    text: &str,
) {
    let Ok(action) = serde_json::from_str::<ClientAction>(text) else {
        return;
    };

    match action {
        ClientAction::MarkRead { id } => {
            let notification = match global.db.notification_by_id(id).await {
                Ok(Some(notification)) => notification,
                Ok(None) => return,
                Err(e) => {
                    tracing::error!(error = %e, "failed to fetch notification");
                    return;
                }
            };

            // Only the addressed recipient may acknowledge a targeted
            // notification.
            if notification
                .recipient_id
                .is_some_and(|recipient_id| recipient_id != user.id)
            {
                return;
            }

            if let Err(e) = global.db.set_notification_read(id).await {
                tracing::error!(error = %e, "failed to mark notification read");
                return;
            }

            tx.send(Message::Text(
                json!({ "type": "notification_marked_read", "id": id }).to_string(),
            ))
            .await
            .ok();
        }
    }
}
