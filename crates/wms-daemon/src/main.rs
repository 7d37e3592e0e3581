//! wms-daemon entry point.
//!
//! This file is intentionally thin: it loads configuration, connects the
//! critical dependencies (Postgres, Redis, Kafka; any failure here aborts
//! startup with a non-zero exit), wires the coordinator, reconciler and
//! shelf bridge, and serves HTTP until SIGINT/SIGTERM. Route handlers live
//! in `routes.rs`; shared state in `state.rs`.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use axum::http::{HeaderValue, Method};
use tokio::sync::watch;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::{error, info, warn, Level};

use wms_config::Config;
use wms_coordinator::InventoryCoordinator;
use wms_daemon::{routes, state::AppState};
use wms_db::{InventoryStore, PgStore};
use wms_events::{BusProducer, EventPublisher, KafkaBus};
use wms_kv::{Kv, RedisKv, ShelfCache, ShelfLock};
use wms_mqtt::{RetryPolicy, ShelfBridge};
use wms_reconcile::PhysicalReconciler;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Silent if no .env exists; production injects env vars directly.
    let _ = dotenvy::dotenv();

    let cfg = Config::from_env().context("invalid configuration")?;
    init_tracing(&cfg.log_level);

    // Critical dependencies: connect or die.
    let pool = wms_db::connect(&cfg.database.url()).await?;
    wms_db::migrate(&pool).await?;
    let store: Arc<dyn InventoryStore> = Arc::new(PgStore::new(pool));

    let kv: Arc<dyn Kv> = Arc::new(RedisKv::connect(&cfg.redis.url()).await?);
    let bus: Arc<dyn BusProducer> = Arc::new(KafkaBus::connect(&cfg.kafka.brokers)?);

    let publisher = Arc::new(EventPublisher::new(
        bus,
        Arc::clone(&store),
        &cfg.kafka.topic,
    ));
    let lock = ShelfLock::new(Arc::clone(&kv));
    let cache = ShelfCache::new(
        Arc::clone(&kv),
        cfg.service.shelf_summary_cache_ttl,
        cfg.service.shelf_status_cache_ttl,
    );

    let coordinator = Arc::new(InventoryCoordinator::new(
        Arc::clone(&store),
        lock.clone(),
        cache,
        Arc::clone(&publisher),
        cfg.service.clone(),
    ));
    let reconciler = Arc::new(PhysicalReconciler::new(
        Arc::clone(&store),
        lock,
        Arc::clone(&publisher),
        cfg.service.clone(),
    ));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    // Background tasks: timeout sweeper + shelf bridge.
    let sweeper_task = {
        let reconciler = Arc::clone(&reconciler);
        let rx = shutdown_rx.clone();
        tokio::spawn(async move { reconciler.run_sweeper(rx).await })
    };
    let bridge_task = {
        let bridge = ShelfBridge::new(
            Arc::clone(&coordinator),
            Arc::clone(&reconciler),
            cfg.mqtt.topic_prefix.clone(),
            RetryPolicy::new(cfg.service.retry_count, cfg.service.retry_delay),
        );
        let mqtt_cfg = cfg.mqtt.clone();
        let rx = shutdown_rx.clone();
        tokio::spawn(async move {
            if let Err(err) = bridge.run(&mqtt_cfg, rx).await {
                error!(error = %err, "shelf bridge exited with error");
            }
        })
    };

    // Signal → shutdown flag.
    tokio::spawn(async move {
        shutdown_signal().await;
        info!("shutdown signal received, draining");
        let _ = shutdown_tx.send(true);
    });

    let app = apply_layers(routes::build_router(AppState::new(coordinator)), &cfg);

    let addr = SocketAddr::from(([0, 0, 0, 0], cfg.server.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!("wms-daemon listening on http://{addr}");

    let graceful = wait_for_flag(shutdown_rx.clone());
    let server = async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(graceful)
            .await
    };

    // Drain outstanding requests for at most the grace window after the
    // shutdown flag flips.
    let forced = {
        let rx = shutdown_rx.clone();
        let grace = cfg.server.shutdown_grace;
        async move {
            wait_for_flag(rx).await;
            tokio::time::sleep(grace).await;
        }
    };

    tokio::select! {
        result = server => result.context("http server error")?,
        _ = forced => warn!("grace period elapsed before drain completed"),
    }

    let _ = sweeper_task.await;
    let _ = bridge_task.await;
    info!("shutdown complete");
    Ok(())
}

fn init_tracing(log_level: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| log_level.into()),
        )
        .init();
}

fn apply_layers(router: axum::Router, cfg: &Config) -> axum::Router {
    let router = router.layer(
        TraceLayer::new_for_http()
            .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
            .on_response(DefaultOnResponse::new().level(Level::INFO)),
    );

    if cfg.server.allow_origins.is_empty() {
        return router;
    }
    let origins: Vec<HeaderValue> = cfg
        .server
        .allow_origins
        .iter()
        .filter_map(|o| HeaderValue::from_str(o).ok())
        .collect();
    router.layer(
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([Method::GET, Method::POST])
            .allow_headers(tower_http::cors::Any),
    )
}

async fn wait_for_flag(mut rx: watch::Receiver<bool>) {
    loop {
        if *rx.borrow_and_update() {
            return;
        }
        if rx.changed().await.is_err() {
            return;
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };
    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(_) => std::future::pending::<()>().await,
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
