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
use crate::global::GlobalState;
use crate::subscription::SubscriptionTopic;

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

    tokio::spawn(serve(global, websocket, business_id));

    Ok(response)
}

/// The activity feed is server-push only; inbound frames are drained and
/// discarded.
async fn serve(global: Arc<GlobalState>, websocket: HyperWebsocket, business_id: i64) {
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
        .subscribe(SubscriptionTopic::BusinessActivity(business_id))
        .await
    {
        Ok(events) => events,
        Err(e) => {
            tracing::error!("failed to subscribe to activity events: {}", e);
            return;
        }
    };

    loop {
        select! {
            msg = rx.next() => {
                match msg {
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
                        tracing::warn!(business_id, missed, "activity subscriber lagging");
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
