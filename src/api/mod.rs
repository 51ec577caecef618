use std::sync::{Arc, Weak};

use anyhow::Result;
use hyper::{Body, Request, StatusCode};
use routerify::{Router, RouterService};

use self::error::RouteError;
use crate::global::GlobalState;

pub mod error;
pub(crate) mod macros;
pub mod v1;

/// Pulls the global state out of the request data.
///
/// The router only holds a weak reference so open keep-alive connections
/// cannot keep the process alive past shutdown.
pub trait RequestGlobalExt {
    fn get_global(&self) -> Result<Arc<GlobalState>, RouteError>;
}

impl RequestGlobalExt for Request<Body> {
    fn get_global(&self) -> Result<Arc<GlobalState>, RouteError> {
        use routerify::prelude::RequestExt;

        self.data::<Weak<GlobalState>>()
            .and_then(|weak| weak.upgrade())
            .ok_or_else(|| {
                RouteError::from((
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "failed to fetch global state",
                ))
            })
    }
}

pub fn routes(global: &Arc<GlobalState>) -> Router<Body, RouteError> {
    Router::builder()
        .data(Arc::downgrade(global))
        .scope("/v1", v1::routes(global))
        .err_handler_with_info(error::error_handler)
        .build()
        .expect("failed to build router")
}

pub async fn run(global: Arc<GlobalState>) -> Result<()> {
    let addr = global.config.api.bind_address;

    let router = routes(&global);
    let service = RouterService::new(router)
        .map_err(|e| anyhow::anyhow!("failed to build router service: {e}"))?;

    let server = hyper::Server::try_bind(&addr)?.serve(service);

    tracing::info!("listening on {}", addr);

    let ctx = global.ctx.clone();
    drop(global);

    server
        .with_graceful_shutdown(async move { ctx.done().await })
        .await?;

    Ok(())
}
