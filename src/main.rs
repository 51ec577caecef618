use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use ledgerstream_api::config::AppConfig;
use ledgerstream_api::context::Context;
use ledgerstream_api::database::PgDatastore;
use ledgerstream_api::store::{KeyValueStore, MemoryStore, RedisStore};
use ledgerstream_api::{api, global::GlobalState, logging, signal};
use sqlx::postgres::PgConnectOptions;
use sqlx::ConnectOptions;
use tokio::{select, signal::unix::SignalKind, time};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::parse()?;

    logging::init(&config.logging.level, config.logging.json)?;

    tracing::debug!("config: {:#?}", config);

    let db = sqlx::PgPool::connect_with(
        PgConnectOptions::from_str(&config.database.uri)?
            .disable_statement_logging()
            .to_owned(),
    )
    .await?;

    let (ctx, handler) = Context::new();

    let kv: Arc<dyn KeyValueStore> = if config.redis.uri.is_empty() {
        tracing::warn!("no redis configured, using the in-process store");
        let store = Arc::new(MemoryStore::new());
        MemoryStore::spawn_sweeper(store.clone(), ctx.clone());
        store
    } else {
        let store = RedisStore::connect(&config.redis.uri).await?;
        tracing::info!("connected to redis");
        Arc::new(store)
    };

    let global = Arc::new(GlobalState::new(
        config,
        ctx,
        Arc::new(PgDatastore::new(db)),
        kv,
    ));

    let api_future = tokio::spawn(api::run(global.clone()));

    // Listen on both sigint and sigterm and cancel the context when
    // either is received.
    let mut signal_handler = signal::SignalHandler::new()
        .with_signal(SignalKind::interrupt())
        .with_signal(SignalKind::terminate());

    select! {
        r = api_future => tracing::error!("api stopped unexpectedly: {:?}", r),
        _ = global.subscriber.run(global.ctx.clone()) => tracing::error!("subscription manager stopped unexpectedly"),
        _ = signal_handler.recv() => tracing::info!("shutting down"),
    }

    // We cannot have a context in scope when we cancel the handler,
    // otherwise it will deadlock.
    drop(global);

    tracing::info!("waiting for tasks to finish");

    select! {
        _ = time::sleep(Duration::from_secs(60)) => tracing::warn!("force shutting down"),
        _ = signal_handler.recv() => tracing::warn!("force shutting down"),
        _ = handler.cancel() => tracing::info!("shutting down"),
    }

    Ok(())
}
