use hyper::{Body, Request, Response, StatusCode};
use routerify::Router;
use serde_json::json;

use crate::api::error::{Result, RouteError};
use crate::api::macros::make_response;

async fn health(_: Request<Body>) -> Result<Response<Body>> {
    tracing::debug!("health check");
    Ok(make_response!(StatusCode::OK, json!({ "status": "ok" })))
}

pub fn routes() -> Router<Body, RouteError> {
    Router::builder()
        .get("/", health)
        .build()
        .expect("failed to build router")
}
