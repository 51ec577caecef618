use std::sync::Arc;

use futures_util::stream::SplitSink;
use futures_util::SinkExt;
use hyper::upgrade::Upgraded;
use hyper::{header, Body, Request, StatusCode};
use hyper_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use hyper_tungstenite::tungstenite::protocol::CloseFrame;
use hyper_tungstenite::tungstenite::Message;
use hyper_tungstenite::WebSocketStream;
use routerify::Router;

use crate::api::error::{Result, ResultExt, RouteError};
use crate::api::v1::jwt::JwtState;
use crate::database::{user, Datastore};
use crate::global::GlobalState;

pub mod activity;
pub mod chat;
pub mod notifications;

pub fn routes() -> Router<Body, RouteError> {
    Router::builder()
        .get("/notifications", notifications::handler)
        .get("/business/:business_id/chat", chat::handler)
        .get("/business/:business_id/activity", activity::handler)
        .build()
        .expect("failed to build router")
}

pub(super) type WsSink = SplitSink<WebSocketStream<Upgraded>, Message>;

/// The access token for socket endpoints comes from the `token` query
/// parameter first (headers are awkward in browser websocket clients),
/// with the `Authorization` header as a fallback.
fn token_from_request(req: &Request<Body>) -> Option<String> {
    if let Some(query) = req.uri().query() {
        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            if key == "token" {
                return Some(value.into_owned());
            }
        }
    }

    req.headers()
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::to_string)
}

/// Resolve the connecting identity before the upgrade happens.
///
/// Rejecting here means a failed handshake: no subscription or presence
/// side effect can exist for a connection that never authenticated.
pub(super) async fn authenticate(
    global: &Arc<GlobalState>,
    req: &Request<Body>,
) -> Result<user::Model> {
    let token =
        token_from_request(req).ok_or((StatusCode::UNAUTHORIZED, "missing access token"))?;

    let jwt = JwtState::verify(global, &token)
        .ok_or((StatusCode::UNAUTHORIZED, "invalid access token"))?;

    let user = global
        .db
        .user_by_id(jwt.user_id)
        .await
        .extend_route("failed to fetch user")?
        .filter(|user| user.is_active)
        .ok_or((StatusCode::UNAUTHORIZED, "invalid access token"))?;

    Ok(user)
}

/// Guard shared by the business-scoped channels: the path business must
/// be the user's own, superusers may attach anywhere. A mismatch is a
/// rejection, never a silent scope downgrade.
pub(super) fn authorize_business(user: &user::Model, business_id: i64) -> Result<()> {
    if user.is_member_of(business_id) {
        Ok(())
    } else {
        Err(RouteError::from((
            StatusCode::FORBIDDEN,
            "not a member of this business",
        )))
    }
}

/// Forward a group event to the client. Returns false once the transport
/// is gone so the caller can wind the connection down.
pub(super) async fn forward(tx: &mut WsSink, payload: &[u8]) -> bool {
    let text = String::from_utf8_lossy(payload).into_owned();
    tx.send(Message::Text(text)).await.is_ok()
}

pub(super) async fn send_shutdown_close(tx: &mut WsSink) {
    tx.send(Message::Close(Some(CloseFrame {
        code: CloseCode::Restart,
        reason: "server is shutting down".into(),
    })))
    .await
    .ok();
}
