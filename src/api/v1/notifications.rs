use hyper::{Body, Request, Response, StatusCode};
use serde_json::json;

use super::models::NotificationView;
use super::{pagination, param_id, require_user};
use crate::api::error::{Result, ResultExt, RouteError};
use crate::api::macros::make_response;
use crate::api::RequestGlobalExt;
use crate::database::Datastore;

/// Notifications addressed to the caller plus broadcasts for its
/// business, newest first.
pub async fn list(req: Request<Body>) -> Result<Response<Body>> {
    let global = req.get_global()?;
    let user = require_user(&req)?;
    let (limit, offset) = pagination(&req);

    let notifications = global
        .db
        .notifications_for_user(&user, limit, offset)
        .await
        .extend_route("failed to fetch notifications")?;

    let results = notifications
        .iter()
        .map(NotificationView::from)
        .collect::<Vec<_>>();

    Ok(make_response!(
        StatusCode::OK,
        json!({ "results": results })
    ))
}

pub async fn unread_count(req: Request<Body>) -> Result<Response<Body>> {
    let global = req.get_global()?;
    let user = require_user(&req)?;

    let unread = global
        .db
        .unread_notification_count(&user)
        .await
        .extend_route("failed to count notifications")?;

    Ok(make_response!(StatusCode::OK, json!({ "unread": unread })))
}

pub async fn mark_read(req: Request<Body>) -> Result<Response<Body>> {
    let global = req.get_global()?;
    let user = require_user(&req)?;
    let id = param_id(&req, "id")?;

    let notification = global
        .db
        .notification_by_id(id)
        .await
        .extend_route("failed to fetch notification")?
        .ok_or((StatusCode::NOT_FOUND, "notification not found"))?;

    // A targeted notification may only be acknowledged by its recipient;
    // broadcasts by any member of the business.
    let permitted = match notification.recipient_id {
        Some(recipient_id) => recipient_id == user.id,
        None => user.is_member_of(notification.business_id),
    };
    if !permitted {
        return Err(RouteError::from((
            StatusCode::FORBIDDEN,
            "not your notification",
        )));
    }

    global
        .db
        .set_notification_read(id)
        .await
        .extend_route("failed to mark notification read")?;

    Ok(make_response!(StatusCode::OK, json!({ "status": "ok" })))
}

pub async fn mark_all_read(req: Request<Body>) -> Result<Response<Body>> {
    let global = req.get_global()?;
    let user = require_user(&req)?;

    let updated = global
        .db
        .set_all_notifications_read(&user)
        .await
        .extend_route("failed to mark notifications read")?;

    Ok(make_response!(
        StatusCode::OK,
        json!({ "status": "ok", "updated": updated })
    ))
}
