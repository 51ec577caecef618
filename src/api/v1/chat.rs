use std::collections::HashMap;

use hyper::body::HttpBody;
use hyper::{Body, Request, Response, StatusCode};
use serde_json::json;

use super::models::ChatMessageView;
use super::{pagination, param_id, require_user};
use crate::api::error::{Result, ResultExt, RouteError};
use crate::api::macros::make_response;
use crate::api::RequestGlobalExt;
use crate::database::Datastore;
use crate::recorder::{self, RecorderError};

/// Chat history of a business, newest first.
pub async fn list(req: Request<Body>) -> Result<Response<Body>> {
    let global = req.get_global()?;
    let user = require_user(&req)?;
    let business_id = param_id(&req, "business_id")?;

    if !user.is_member_of(business_id) {
        return Err(RouteError::from((
            StatusCode::FORBIDDEN,
            "not a member of this business",
        )));
    }

    let (limit, offset) = pagination(&req);

    let messages = global
        .db
        .chat_messages_by_business(business_id, limit, offset)
        .await
        .extend_route("failed to fetch chat messages")?;

    let mut sender_ids = messages
        .iter()
        .map(|message| message.sender_id)
        .collect::<Vec<_>>();
    sender_ids.sort_unstable();
    sender_ids.dedup();

    let senders = global
        .db
        .users_by_ids(&sender_ids)
        .await
        .extend_route("failed to fetch senders")?
        .into_iter()
        .map(|sender| (sender.id, sender))
        .collect::<HashMap<_, _>>();

    let results = messages
        .iter()
        .filter_map(|message| {
            senders
                .get(&message.sender_id)
                .map(|sender| ChatMessageView::new(message, sender))
        })
        .collect::<Vec<_>>();

    Ok(make_response!(
        StatusCode::OK,
        json!({ "results": results })
    ))
}

#[derive(serde::Deserialize)]
struct CreateMessageRequest {
    content: String,
}

/// REST variant of posting into the business chat room. Persists and
/// broadcasts through the same path as the socket.
pub async fn create(mut req: Request<Body>) -> Result<Response<Body>> {
    let global = req.get_global()?;
    let user = require_user(&req)?;
    let business_id = param_id(&req, "business_id")?;

    if !user.is_member_of(business_id) {
        return Err(RouteError::from((
            StatusCode::FORBIDDEN,
            "not allowed to post to this business chat",
        )));
    }

    global
        .db
        .business_by_id(business_id)
        .await
        .extend_route("failed to fetch business")?
        .ok_or((StatusCode::NOT_FOUND, "business not found"))?;

    let body = req
        .body_mut()
        .data()
        .await
        .transpose()
        .extend_route((StatusCode::BAD_REQUEST, "failed to read body"))?
        .unwrap_or_default();

    let request = serde_json::from_slice::<CreateMessageRequest>(&body)
        .extend_route((StatusCode::BAD_REQUEST, "body is not valid json"))?;

    let message = match recorder::post_chat_message(&global, business_id, &user, &request.content)
        .await
    {
        Ok(Some(message)) => message,
        Ok(None) => {
            return Err(RouteError::from((
                StatusCode::BAD_REQUEST,
                "message is empty",
            )))
        }
        Err(RecorderError::MessageTooLong) => {
            return Err(RouteError::from((
                StatusCode::BAD_REQUEST,
                "message too long",
            )))
        }
        Err(e) => return Err(RouteError::from((
            StatusCode::INTERNAL_SERVER_ERROR,
            "failed to post message",
            e,
        ))),
    };

    Ok(make_response!(
        StatusCode::CREATED,
        json!(ChatMessageView::new(&message, &user))
    ))
}
