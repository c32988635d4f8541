mod api;
mod maintenance;
mod middleware;
mod pipeline;
mod scheduler;
mod worker;

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use crate::{
    api::{build_app, default_rate_limit_state, AppState},
    middleware::MaintenanceAuth,
    pipeline::PipelineContext,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = Arc::new(orgtrust_core::load_app_config()?);
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let pool_config = orgtrust_db::PoolConfig::from_app_config(&config);
    let pool = orgtrust_db::connect_pool(&config.database_url, pool_config).await?;
    orgtrust_db::run_migrations(&pool).await?;

    let ctx = PipelineContext::build(pool, Arc::clone(&config))?;

    let _scheduler = scheduler::build_scheduler(Arc::clone(&ctx)).await?;
    let _workers = worker::spawn_workers(&ctx);

    let auth = MaintenanceAuth::from_token(
        config.maintenance_token.as_deref(),
        matches!(config.env, orgtrust_core::Environment::Development),
    )?;
    let app = build_app(AppState { ctx }, auth, default_rate_limit_state());

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!(addr = %config.bind_addr, "orgtrust server listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to listen for ctrl-c");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, starting graceful shutdown");
}
