use std::sync::Arc;

use hyper::header;
use hyper::Body;
use routerify::prelude::RequestExt;
use routerify::Middleware;

use crate::api::error::{ResultExt, RouteError};
use crate::api::v1::jwt::JwtState;
use crate::api::RequestGlobalExt;
use crate::database::Datastore;
use crate::global::GlobalState;

/// Resolves a `Authorization: Bearer` header to a user and stashes it in
/// the request context.
///
/// An absent or invalid header never fails the request here; handlers
/// that need an identity reject when the context is empty. The socket
/// endpoints run their own token extraction because they accept the
/// token as a query parameter as well.
pub fn auth_middleware(_global: &Arc<GlobalState>) -> Middleware<Body, RouteError> {
    Middleware::pre(|req| async move {
        let Some(header) = req.headers().get(header::AUTHORIZATION) else {
            return Ok(req);
        };

        let Ok(header) = header.to_str() else {
            return Ok(req);
        };

        let Some(token) = header.strip_prefix("Bearer ") else {
            return Ok(req);
        };

        let global = req.get_global()?;

        let Some(jwt) = JwtState::verify(&global, token) else {
            tracing::debug!("rejected invalid access token");
            return Ok(req);
        };

        let user = global
            .db
            .user_by_id(jwt.user_id)
            .await
            .extend_route("failed to fetch user")?;

        if let Some(user) = user.filter(|user| user.is_active) {
            req.set_context(user);
        }

        Ok(req)
    })
}
