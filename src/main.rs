use std::net::SocketAddr;
use std::sync::Arc;

use redis::Client as RedisClient;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use vanganh_api::{
    build_router,
    config::Config,
    db,
    services::blob::{BlobStore, LocalBlobStore},
    store::{DocumentStore, MemoryDocumentStore, PgDocumentStore},
    AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Arc::new(Config::from_env()?);

    let store: Arc<dyn DocumentStore> = match &config.database_url {
        Some(url) => {
            let pool = db::create_pool(url).await?;
            db::run_migrations(&pool).await?;
            info!("Database connected and migrations applied");
            Arc::new(PgDocumentStore::new(pool))
        }
        None => {
            warn!("DATABASE_URL not set, using the in-memory document store");
            Arc::new(MemoryDocumentStore::new())
        }
    };

    tokio::fs::create_dir_all(&config.media_dir).await?;
    let blobs: Arc<dyn BlobStore> = Arc::new(LocalBlobStore::new(
        &config.media_dir,
        &config.public_base_url,
    ));

    let redis = match connect_redis(&config.redis_url).await {
        Ok(conn) => {
            info!("Redis connected");
            Some(conn)
        }
        Err(e) => {
            warn!("Redis unavailable, contact form rate limiting disabled: {}", e);
            None
        }
    };

    let state = AppState::new(store, blobs, redis, config.clone());
    let app = build_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    info!("Vàng Anh API listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}

async fn connect_redis(url: &str) -> anyhow::Result<redis::aio::MultiplexedConnection> {
    let client = RedisClient::open(url)?;
    Ok(client.get_multiplexed_async_connection().await?)
}
