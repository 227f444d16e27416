use logoforge_api::{build_router, state::AppState};
use logoforge_config::Settings;
use logoforge_db::{connect, indexes::ensure_indexes};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file (silently ignore if missing)
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            "logoforge_api=debug,logoforge_services=debug,logoforge_db=debug,tower_http=debug".into()
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let settings = Settings::load()?;
    info!("Starting LogoForge API on {}:{}", settings.app.host, settings.app.port);
    info!(
        backend = %settings.provider.backend,
        workers = settings.generation.workers,
        bucket = %settings.s3.bucket,
        "Generation config"
    );

    let db = connect(&settings).await?;
    ensure_indexes(&db).await?;

    // This binary links no image model, so only the remote backend can start
    let app_state = AppState::new(&db, settings.clone(), None)?;

    // Pick up jobs that were queued when the previous process stopped
    if let Err(e) = app_state.logos.recover_pending().await {
        warn!(error = %e, "Failed to recover pending tasks");
    }

    let app = build_router(app_state);

    let addr = format!("{}:{}", settings.app.host, settings.app.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
