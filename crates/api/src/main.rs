use anyhow::Context;

use taxtally_api::config::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    taxtally_observability::init();

    let config = AppConfig::from_env()?;
    let app = taxtally_api::app::build_app(&config).await?;

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    tracing::info!(addr = %listener.local_addr()?, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("shutdown signal received, draining"),
        Err(e) => {
            tracing::warn!(error = %e, "failed to install shutdown signal handler");
            std::future::pending::<()>().await;
        }
    }
}
