use anyhow::Context;
use axum::Router;
use tokio::net::TcpListener;

use aeolus_backend::core::config::Settings;
use aeolus_backend::core::logging;
use aeolus_backend::server::router;
use aeolus_backend::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::from_env().context("invalid configuration")?;
    logging::init(&settings.log_dir);

    let port = settings.port;
    let state = AppState::initialize(settings).context("failed to initialize services")?;

    let bind_addr = format!("0.0.0.0:{port}");
    let listener = TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind to {bind_addr}"))?;
    let addr = listener.local_addr()?;
    tracing::info!("listening on {addr}");

    let app: Router = router::router(state);
    axum::serve(listener, app).await.context("server error")?;

    Ok(())
}
