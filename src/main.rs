use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::info;
use tripjournal::config::AppConfig;
use tripjournal::db::{init_pool, run_migrations};
use tripjournal::error::AppError;
use tripjournal::routes::create_router;
use tripjournal::services::{
    geocoding::HttpGeocoder, photos::PhotoStorage, store::JournalStore,
};
use tripjournal::state::AppState;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_logging();

    let config = AppConfig::from_env()?;
    let db = init_pool(&config.database_url).await?;
    run_migrations(&db).await?;

    let store = JournalStore::new(db);

    let photos = PhotoStorage::new(config.upload_root.clone(), config.public_upload_base.clone());
    photos.ensure_structure().await?;

    if config.mapbox_token.is_none() {
        info!("MAPBOX_ACCESS_TOKEN not set, place search is disabled");
    }
    let geocoder = Arc::new(HttpGeocoder::new(
        config.mapbox_token.clone(),
        config.opencage_key.clone(),
    )?);

    let state = AppState::new(config.clone(), store, photos, geocoder);
    let app = create_router(state);

    let listener = TcpListener::bind(config.listen_addr).await?;
    info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, app.into_make_service()).await?;

    Ok(())
}

fn init_logging() {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let fmt_layer = tracing_subscriber::fmt::layer().with_target(false);
    let filter_layer = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,tripjournal=debug,tower_http=info".into());

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .init();
}
