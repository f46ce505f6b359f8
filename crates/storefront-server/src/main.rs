mod api;
mod middleware;
mod scheduler;

use std::sync::Arc;

use storefront_sheets::SheetSync;
use tracing_subscriber::EnvFilter;

use crate::{
    api::{build_app, default_rate_limit_state, AppState},
    middleware::{AuthState, SheetSecret},
    scheduler::CronJobRegistry,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = Arc::new(storefront_core::load_app_config()?);
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let pool_config = storefront_db::PoolConfig::from_app_config(&config);
    let pool = storefront_db::connect_pool(&config.database_url, pool_config).await?;
    storefront_db::run_migrations(&pool).await?;

    let sheets = Arc::new(SheetSync::from_config(config.sheets.as_ref(), pool.clone()));

    let scheduler =
        scheduler::build_scheduler(pool.clone(), Arc::clone(&config), Arc::clone(&sheets)).await?;
    let jobs = Arc::new(CronJobRegistry::new(scheduler.clone(), Arc::clone(&sheets)));

    let auth = AuthState::from_env(config.is_development())?;
    if config.sheet_webhook_secret.is_none() {
        tracing::warn!("GOOGLE_SHEET_SECRET not set; sheet webhook will reject every request");
    }
    let sheet_secret = SheetSecret(config.sheet_webhook_secret.as_deref().map(Arc::from));

    let app = build_app(
        AppState { pool, sheets, jobs },
        auth,
        default_rate_limit_state(),
        sheet_secret,
    );

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!(addr = %config.bind_addr, "storefront server listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    let mut scheduler = scheduler;
    if let Err(e) = scheduler.shutdown().await {
        tracing::warn!(error = %e, "scheduler shutdown failed");
    }
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, starting graceful shutdown");
}
