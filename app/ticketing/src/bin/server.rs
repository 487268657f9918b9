//! Ticketing server binary: wires the durable store, coordination store,
//! seat lifecycle engine and HTTP facade together, then serves them.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::routing::get;
use axum::Router;

use ticketing_app::catalog::PremiumCatalog;
use ticketing_app::config::Config;
use ticketing_app::engine::{reclaimer, ImmediateEngine, WorkerRegistry};
use ticketing_app::state::AppState;
use ticketing_postgres::PgStore;
use ticketing_runtime::metrics::MetricsServer;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "info,ticketing=debug,sqlx=warn".to_string()),
        )
        .init();

    let config = Config::from_env();

    tracing::info!("🎫 Starting Ticketing System Server...");

    let store = PgStore::connect(&config.postgres.url).await?;
    tracing::info!("connected to durable store and ran migrations");

    let (mutex, queue, status) =
        ticketing_coordination::connect(&config.redis.url, config.engine.lock_timeout()).await?;
    tracing::info!("connected to coordination store");

    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);

    let immediate = Arc::new(ImmediateEngine::new(
        store.clone(),
        mutex,
        config.engine.clone(),
    ));
    let workers = WorkerRegistry::new(
        store.clone(),
        queue.clone(),
        status.clone(),
        config.engine.clone(),
        shutdown_rx.clone(),
    );
    let premium_catalog = Arc::new(PremiumCatalog::new(&config.premium_user_ids));

    let state = AppState {
        immediate,
        queue,
        status,
        workers,
        premium_catalog,
        config: Arc::new(config.clone()),
    };

    let reclaimer_handle = reclaimer::spawn(store, config.engine.clone(), shutdown_rx);

    let metrics_addr: SocketAddr =
        format!("{}:{}", config.server.metrics_host, config.server.metrics_port).parse()?;
    let mut metrics_server = MetricsServer::new(metrics_addr);
    metrics_server.start()?;
    let metrics_handle = Arc::new(metrics_server);
    let metrics_router: Router = Router::new().route(
        "/metrics",
        get(move || {
            let metrics_handle = metrics_handle.clone();
            async move { metrics_handle.render().unwrap_or_default() }
        }),
    );
    let metrics_listener = tokio::net::TcpListener::bind(metrics_addr).await?;
    tokio::spawn(async move {
        if let Err(err) = axum::serve(metrics_listener, metrics_router).await {
            tracing::error!(error = %err, "metrics server failed");
        }
    });

    let app = ticketing_app::build_router(state);
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!(%addr, "🚀 Ticketing API listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("shutdown signal received");
            let _ = shutdown_tx.send(true);
        })
        .await?;

    reclaimer_handle.await.ok();

    Ok(())
}
