use std::collections::HashMap;

use hyper::{Body, Request, Response, StatusCode};
use serde_json::json;

use super::models::ActivityView;
use super::{pagination, param_id, require_user};
use crate::api::error::{Result, ResultExt, RouteError};
use crate::api::macros::make_response;
use crate::api::RequestGlobalExt;
use crate::database::Datastore;

/// The audit feed of a business, newest first.
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

    let activities = global
        .db
        .activities_by_business(business_id, limit, offset)
        .await
        .extend_route("failed to fetch activities")?;

    let mut actor_ids = activities
        .iter()
        .filter_map(|activity| activity.actor_id)
        .collect::<Vec<_>>();
    actor_ids.sort_unstable();
    actor_ids.dedup();

    let actors = global
        .db
        .users_by_ids(&actor_ids)
        .await
        .extend_route("failed to fetch actors")?
        .into_iter()
        .map(|actor| (actor.id, actor))
        .collect::<HashMap<_, _>>();

    let results = activities
        .iter()
        .map(|activity| {
            let actor = activity.actor_id.and_then(|id| actors.get(&id));
            ActivityView::new(activity, actor)
        })
        .collect::<Vec<_>>();

    Ok(make_response!(
        StatusCode::OK,
        json!({ "results": results })
    ))
}
