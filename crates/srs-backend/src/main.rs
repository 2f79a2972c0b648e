use std::net::SocketAddr;
use std::sync::Arc;

use srs_backend::config::Config;
use srs_backend::db::Database;
use srs_backend::state::AppState;
use srs_backend::workers::WorkerManager;
use srs_backend::{create_app, logging, seed};

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    let config = Config::from_env();

    let _log_guard = logging::init_tracing(&config.log_level);

    let db = match Database::init(&config.database_url).await {
        Ok(db) => db,
        Err(err) => {
            tracing::error!(error = %err, "database initialization failed");
            std::process::exit(1);
        }
    };

    if seed::seed_enabled() {
        if let Err(err) = seed::seed_demo_items(&db).await {
            tracing::warn!(error = %err, "demo seeding failed");
        }
    }

    let worker_manager = match WorkerManager::new(Arc::clone(&db), config.clone()).await {
        Ok(manager) => {
            if let Err(err) = manager.start().await {
                tracing::error!(error = %err, "failed to start workers");
            }
            Some(Arc::new(manager))
        }
        Err(err) => {
            tracing::warn!(error = %err, "worker manager not initialized");
            None
        }
    };

    let state = AppState::new(db, config.clone());
    let app = create_app(state);

    let addr = config.bind_addr();
    tracing::info!(%addr, "srs-backend listening");

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(err) => {
            tracing::error!(error = %err, %addr, "bind failed");
            std::process::exit(1);
        }
    };

    let server = axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_signal());

    if let Err(err) = server.await {
        tracing::error!(error = %err, "server error");
    }

    tracing::info!("HTTP server stopped, initiating graceful shutdown");

    if let Some(ref manager) = worker_manager {
        manager.stop().await;
    }

    tracing::info!("graceful shutdown complete");
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        let mut sigterm =
            signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");
        sigterm.recv().await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
