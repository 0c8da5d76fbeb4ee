mod agent;
mod config;
mod errors;
mod models;
mod routes;
mod service;
mod store;

use tracing::info;

use crate::config::AppConfig;
use crate::routes::AppContext;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present (development convenience)
    dotenvy::dotenv().ok();

    // Initialise tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "prompt_studio=debug,tower_http=debug".into()),
        )
        .init();

    // ── Configuration ─────────────────────────────────────────────────────────
    let config = AppConfig::from_env()?;

    // ── Dependency wiring ─────────────────────────────────────────────────────
    let ctx = AppContext::from_config(&config)?;
    info!(
        text_model = %config.text_model,
        image_model = %config.image_model,
        "Provider clients ready"
    );

    // ── Router ────────────────────────────────────────────────────────────────
    let app = routes::router(ctx);

    // ── Listen ────────────────────────────────────────────────────────────────
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Listening on http://{addr}/ (session socket at /ws/session)");

    axum::serve(listener, app).await?;
    Ok(())
}
