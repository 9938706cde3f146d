use std::net::SocketAddr;
use std::process::ExitCode;

use mathlingo_backend::config::{Config, EngineConfig};
use mathlingo_backend::db::DatabaseProxy;
use mathlingo_backend::logging::init_tracing;
use mathlingo_backend::seed::seed_demo_content;
use mathlingo_backend::state::AppState;
use mathlingo_backend::build_app;

#[tokio::main]
async fn main() -> ExitCode {
    let _ = dotenvy::dotenv();
    let config = Config::from_env();
    let _log_guard = init_tracing(&config.log_level);

    let db_proxy = match DatabaseProxy::from_env().await {
        Ok(proxy) => proxy,
        Err(err) => {
            tracing::error!(error = %err, "database initialization failed");
            return ExitCode::FAILURE;
        }
    };

    let state = AppState::new(db_proxy.clone(), EngineConfig::from_env());

    if config.seed_demo_content {
        if let Err(err) = seed_demo_content(&state.content(), &*db_proxy).await {
            tracing::warn!(error = %err, "demo content seeding failed");
        }
    }

    let app = build_app(state);

    let addr = config.bind_addr();
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(err) => {
            tracing::error!(%addr, error = %err, "bind listener failed");
            return ExitCode::FAILURE;
        }
    };
    tracing::info!(%addr, "mathlingo backend listening");

    let server = axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_signal());

    if let Err(e) = server.await {
        tracing::error!(error = %e, "server error");
        return ExitCode::FAILURE;
    }

    db_proxy.pool().close().await;
    tracing::info!("graceful shutdown complete");
    ExitCode::SUCCESS
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %err, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                tracing::warn!(error = %err, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("shutdown signal received");
}
