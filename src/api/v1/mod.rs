use std::sync::Arc;

use hyper::{Body, Request, StatusCode};
use routerify::Router;

use super::error::{Result, RouteError};
use crate::database::user;
use crate::global::GlobalState;

pub mod activity;
pub mod chat;
pub mod health;
pub mod jwt;
pub mod middleware;
pub mod models;
pub mod notifications;
pub mod users;
pub mod ws;

pub fn routes(global: &Arc<GlobalState>) -> Router<Body, RouteError> {
    Router::builder()
        .scope("/health", health::routes())
        .middleware(middleware::auth::auth_middleware(global))
        .scope("/ws", ws::routes())
        .get("/notifications", notifications::list)
        .get("/notifications/unread_count", notifications::unread_count)
        .post("/notifications/mark_all_read", notifications::mark_all_read)
        .post("/notifications/:id/mark_read", notifications::mark_read)
        .get("/business/:business_id/activity", activity::list)
        .get("/business/:business_id/chat/messages", chat::list)
        .post("/business/:business_id/chat/messages", chat::create)
        .get("/business/:business_id/online_users", users::online_users)
        .build()
        .expect("failed to build router")
}

/// The authenticated caller, resolved by the auth middleware.
pub(super) fn require_user(req: &Request<Body>) -> Result<user::Model> {
    use routerify::prelude::RequestExt;

    req.context::<user::Model>()
        .ok_or_else(|| RouteError::from((StatusCode::UNAUTHORIZED, "authentication required")))
}

/// Parse a path parameter as an id.
pub(super) fn param_id(req: &Request<Body>, name: &str) -> Result<i64> {
    use routerify::prelude::RequestExt;

    req.param(name)
        .and_then(|raw| raw.parse::<i64>().ok())
        .ok_or_else(|| RouteError::from((StatusCode::BAD_REQUEST, "invalid id")))
}

const DEFAULT_PAGE_SIZE: i64 = 50;
const MAX_PAGE_SIZE: i64 = 200;

/// `limit`/`offset` query parameters with sane bounds.
pub(super) fn pagination(req: &Request<Body>) -> (i64, i64) {
    let mut limit = DEFAULT_PAGE_SIZE;
    let mut offset = 0;

    if let Some(query) = req.uri().query() {
        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            match key.as_ref() {
                "limit" => {
                    if let Ok(value) = value.parse::<i64>() {
                        limit = value.clamp(1, MAX_PAGE_SIZE);
                    }
                }
                "offset" => {
                    if let Ok(value) = value.parse::<i64>() {
                        offset = value.max(0);
                    }
                }
                _ => {}
            }
        }
    }

    (limit, offset)
}
