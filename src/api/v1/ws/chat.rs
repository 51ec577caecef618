use std::sync::Arc;

use futures_util::StreamExt;
use hyper::{Body, Request, Response, StatusCode};
use hyper_tungstenite::tungstenite::Message;
use hyper_tungstenite::HyperWebsocket;
use tokio::select;
use tokio::sync::broadcast::error::RecvError;

use super::{authenticate, authorize_business, forward, send_shutdown_close};
use crate::api::error::{Result, ResultExt};
use crate::api::v1::param_id;
use crate::api::RequestGlobalExt;
use crate::database::user;
use crate::global::GlobalState;
use crate::presence;
use crate::recorder;
use crate::subscription::SubscriptionTopic;

/// Inbound frames on the chat socket. Anything that does not parse into
/// one of these variants is dropped without closing the connection.
#[derive(serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ClientMessage {
    Message { content: String },
}

pub async fn handler(mut req: Request<Body>) -> Result<Response<Body>> {
    let global = req.get_global()?;
    let business_id = param_id(&req, "business_id")?;

    let user = authenticate(&global, &req).await?;
    authorize_business(&user, business_id)?;

    if !hyper_tungstenite::is_upgrade_request(&req) {
        return Err((StatusCode::BAD_REQUEST, "expected websocket upgrade").into());
    }

    let (response, websocket) = hyper_tungstenite::upgrade(&mut req, None)
        .extend_route((StatusCode::BAD_REQUEST, "failed to upgrade to websocket"))?;

    tokio::spawn(serve(global, websocket, user, business_id));

    Ok(response)
}

async fn serve(
    global: Arc<GlobalState>,
    websocket: HyperWebsocket,
    user: user::Model,
    business_id: i64,
) {
    let websocket = match websocket.await {
        Ok(websocket) => websocket,
        Err(e) => {
            tracing::error!("failed to finish websocket upgrade: {}", e);
            return;
        }
    };

    let (mut tx, mut rx) = websocket.split();

    let mut events = match global
        .subscriber
        .subscribe(SubscriptionTopic::BusinessChat(business_id))
        .await
    {
        Ok(events) => events,
        Err(e) => {
            tracing::error!("failed to subscribe to chat events: {}", e);
            return;
        }
    };

    // Presence is a best-effort signal, a down store never blocks the
    // connection.
    if let Err(e) = presence::mark_online(&global, user.id, Some(business_id)).await {
        tracing::warn!(user_id = user.id, error = %e, "failed to mark user online");
    }

    loop {
        select! {
            msg = rx.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        handle_inbound(&global, &user, business_id, &text).await;
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        tracing::debug!("websocket receive error: {}", e);
                        break;
                    }
                }
            }
            event = events.recv() => {
                match event {
                    Ok(payload) => {
                        if !forward(&mut tx, &payload).await {
                            break;
                        }
                    }
                    Err(RecvError::Lagged(missed)) => {
                        tracing::warn!(user_id = user.id, missed, "chat subscriber lagging");
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

    if let Err(e) = presence::mark_offline(&global, user.id, Some(business_id)).await {
        tracing::warn!(user_id = user.id, error = %e, "failed to mark user offline");
    }

    // Dropping `events` detaches this connection from the group.
}

async fn handle_inbound(
    global: &Arc<GlobalState>,
    user: &user::Model,
    business_id: i64,
    text: &str,
) {
    let Ok(message) = serde_json::from_str::<ClientMessage>(text) else {
        // Malformed frames are dropped, the connection stays open.
        return;
    };

    match message {
        ClientMessage::Message { content } => {
            if let Err(e) = recorder::post_chat_message(global, business_id, user, &content).await
            {
                tracing::error!(user_id = user.id, error = %e, "failed to post chat message");
            }
        }
    }
}
