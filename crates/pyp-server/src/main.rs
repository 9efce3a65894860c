mod api;
mod auth;
mod middleware;
mod scheduler;

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use crate::{
    api::{build_app, default_rate_limit_state, AppState},
    auth::{Mailer, TokenKeys},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = Arc::new(pyp_core::load_app_config()?);
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let pool_config = pyp_db::PoolConfig::from_app_config(&config);
    let pool = pyp_db::connect_pool(&config.database_url, pool_config).await?;
    let applied = pyp_db::run_migrations(&pool).await?;
    tracing::info!(applied, "migrations up to date");

    let _scheduler = scheduler::build_scheduler(pool.clone()).await?;

    let gemini = match config.gemini_api_key.as_deref() {
        Some(key) => Some(Arc::new(pyp_assistant::GeminiClient::new(
            key,
            &config.gemini_model,
            config.http_timeout_secs,
        )?)),
        None => {
            tracing::warn!("GEMINI_API_KEY not set; support chat is disabled");
            None
        }
    };

    let state = AppState {
        pool,
        tokens: TokenKeys::new(&config.jwt_secret, config.jwt_ttl_hours),
        mailer: Mailer::from_config(&config),
        gemini,
        config: Arc::clone(&config),
    };
    let app = build_app(state, default_rate_limit_state());

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!(addr = %config.bind_addr, env = %config.env, "pyp-server listening");
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
