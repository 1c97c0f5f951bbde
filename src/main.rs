//! gcache node
//!
//! Runs one cache node: a demo group backed by an in-memory table, the
//! peer server other nodes fetch from, and optionally the front-end API.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use gcache::api::{create_router, ApiState};
use gcache::{create_peer_router, Config, GetterFn, Group, GroupRegistry, HttpPool};

/// Main entry point for a gcache node.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Register the demo group with its loader
/// 4. Create the peer pool and register it with the group
/// 5. Start the front-end API server if `API_PORT` is set
/// 6. Serve the peer router until SIGINT/SIGTERM
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gcache=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting gcache node");

    let config = Config::from_env();
    info!(
        "Configuration loaded: self={}, peers={:?}, group={}, cache_bytes={}, port={}",
        config.self_addr, config.peers, config.group_name, config.cache_bytes, config.server_port
    );

    let registry = GroupRegistry::new();
    let group = create_demo_group(&config, &registry)?;

    let pool = Arc::new(HttpPool::with_options(
        config.self_addr.clone(),
        config.pool_options(),
    ));
    pool.set(&config.peers);
    group.register_peers(pool.clone())?;

    if let Some(api_port) = config.api_port {
        let addr = SocketAddr::from(([0, 0, 0, 0], api_port));
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .with_context(|| format!("binding api server on {}", addr))?;
        let app = create_router(ApiState::new(registry.clone(), group.clone()));
        info!("API server listening on http://{}", addr);

        tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                error!("API server failed: {}", e);
            }
        });
    }

    let app = create_peer_router(pool, registry);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding peer server on {}", addr))?;
    info!("Peer server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("peer server failed")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Registers the demo group, loading from a small in-memory score table.
fn create_demo_group(config: &Config, registry: &GroupRegistry) -> anyhow::Result<Arc<Group>> {
    let db: Arc<HashMap<&'static str, &'static str>> =
        Arc::new([("Tom", "630"), ("Jack", "589"), ("Sam", "567")].into());

    let group = Group::builder(config.group_name.clone())
        .cache_bytes(config.cache_bytes)
        .getter(GetterFn::new(move |key: String| {
            let db = Arc::clone(&db);
            async move {
                info!("[SlowDB] search key {}", key);
                db.get(key.as_str())
                    .map(|v| v.as_bytes().to_vec())
                    .ok_or_else(|| anyhow::anyhow!("{} not exist", key))
            }
        }))
        .register(registry)?;

    Ok(group)
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            warn!("Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            warn!("Received SIGTERM, initiating shutdown...");
        }
    }
}
