//! `policyd serve` — open the store, wire the binder, serve the API.

use std::sync::Arc;

use anyhow::Context;
use tracing::{info, warn};

use policygrid_binding::PolicyBinder;
use policygrid_core::PolicydConfig;
use policygrid_notify::HttpScheduleNotifier;
use policygrid_state::StateStore;

pub async fn run(config: PolicydConfig) -> anyhow::Result<()> {
    info!("policyd starting");

    let addr = config.listen_addr()?;
    let timeout = config.scheduler_timeout()?;

    // ── Store ──────────────────────────────────────────────────

    if let Some(dir) = config.store.path.parent() {
        if !dir.as_os_str().is_empty() {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("creating store directory {}", dir.display()))?;
        }
    }
    let store = StateStore::open(&config.store.path)?;
    info!(path = ?config.store.path, "policy store opened");

    // ── Scheduler ──────────────────────────────────────────────

    let notifier = HttpScheduleNotifier::new(&config.scheduler.url, timeout)?;
    info!(url = %config.scheduler.url, ?timeout, "scheduler notifier ready");

    let binder = PolicyBinder::new(Arc::new(store), Arc::new(notifier));

    // ── API server ─────────────────────────────────────────────

    let router = policygrid_api::build_router(binder);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    info!(%addr, "API server listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "failed to listen for ctrl-c");
                std::future::pending::<()>().await;
            }
            info!("shutdown signal received");
        })
        .await?;

    info!("policyd stopped");
    Ok(())
}
