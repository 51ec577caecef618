use hyper::{Body, Request, Response, StatusCode};
use serde_json::json;

use super::{param_id, require_user};
use crate::api::error::{Result, ResultExt, RouteError};
use crate::api::macros::make_response;
use crate::api::RequestGlobalExt;
use crate::database::Datastore;
use crate::presence;

/// Members of the business that currently hold a liveness marker.
pub async fn online_users(req: Request<Body>) -> Result<Response<Body>> {
    let global = req.get_global()?;
    let user = require_user(&req)?;
    let business_id = param_id(&req, "business_id")?;

    if !user.is_member_of(business_id) {
        return Err(RouteError::from((
            StatusCode::FORBIDDEN,
            "not a member of this business",
        )));
    }

    let members = global
        .db
        .users_by_business(business_id)
        .await
        .extend_route("failed to fetch users")?;

    let candidates = members.iter().map(|member| member.id).collect::<Vec<_>>();

    let online = presence::get_online_users(&global, business_id, &candidates)
        .await
        .extend_route("failed to query presence")?;

    let results = members
        .iter()
        .filter(|member| online.contains(&member.id))
        .map(|member| json!({ "id": member.id, "email": member.email }))
        .collect::<Vec<_>>();

    Ok(make_response!(
        StatusCode::OK,
        json!({ "results": results })
    ))
}
