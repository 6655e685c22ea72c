//! spindle-server - entry point.
//!
//! # 起動順序
//! 1. 引数と設定ファイルの読み込み
//! 2. tracing の初期化（guard はプロセス終了まで保持）
//! 3. TaskService の構築（worker 起動）
//! 4. HTTP サーバー起動、シグナルで graceful shutdown
//! 5. worker pool を deadline 付きで停止

mod config;
mod dto;
mod error;
mod logging;
mod routes;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use spindle_core::{ServiceBuilder, TaskManager};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::config::{Config, DEFAULT_CONFIG_PATH};
use crate::routes::AppState;

#[derive(Debug, Parser)]
#[command(name = "spindle-server", version, about = "Asynchronous task processing service")]
struct Args {
    /// Path to the JSON configuration file.
    #[arg(long, env = "SPINDLE_CONFIG", default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let cfg = Config::load(&args.config)?;

    let _log_guard = logging::init(&cfg.logger, cfg.server.is_production())?;
    info!(
        version = env!("CARGO_PKG_VERSION"),
        env = %cfg.server.env,
        config = %args.config.display(),
        "spindle-server starting"
    );

    let pool_config = cfg.workers.pool_config();
    info!(
        workers = pool_config.worker_count,
        queue_capacity = pool_config.queue_capacity,
        processing_delay_ms = pool_config.processing_delay.as_millis() as u64,
        "starting worker pool"
    );
    let service: Arc<dyn TaskManager> = Arc::new(
        ServiceBuilder::new()
            .pool_config(pool_config)
            .build()
            .context("failed to build task service")?,
    );

    let shutdown = CancellationToken::new();
    let app = routes::router(AppState::new(Arc::clone(&service), shutdown.clone()));

    let addr = SocketAddr::from(([0, 0, 0, 0], cfg.server.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind to {addr}"))?;
    info!(%addr, "HTTP server listening");

    tokio::spawn({
        let shutdown = shutdown.clone();
        async move {
            shutdown_signal().await;
            shutdown.cancel();
        }
    });

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown.clone().cancelled_owned())
        .await
        .context("server error")?;

    info!("HTTP server stopped, stopping workers");
    match service.shutdown(cfg.server.shutdown_timeout()).await {
        Ok(()) => info!("spindle-server stopped"),
        Err(e) => {
            // ワーカーは止まっていない可能性がある。プロセス終了で打ち切る
            error!(error = %e, "worker pool did not stop cleanly");
        }
    }
    Ok(())
}

/// Resolves when SIGINT (Ctrl-C) or SIGTERM is received.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to install CTRL+C signal handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut s) => {
                s.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }

    info!("shutdown signal received, starting graceful shutdown");
}
