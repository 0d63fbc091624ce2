use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;

mod boards;
mod config;
mod error;
mod geocode;
mod handlers;
mod images;
mod logic;
mod routes;
mod state;
mod storage;

use crate::boards::flush_dirty_boards;
use crate::config::{Args, StorageChoice};
use crate::geocode::HttpGeocoder;
use crate::routes::api_router;
use crate::state::AppState;
use crate::storage::{FileStorage, MemoryStorage, S3Storage, Storage};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "floorplan_server=info,tower_http=info".into()),
        )
        .init();

    let args = Args::parse();
    let storage: Arc<dyn Storage> = match args.storage_choice() {
        StorageChoice::Memory => {
            tracing::warn!("using in-memory storage; plans are lost on restart");
            Arc::new(MemoryStorage::default())
        }
        StorageChoice::File(data_dir) => {
            tokio::fs::create_dir_all(&data_dir).await?;
            tracing::info!(dir = %data_dir.display(), "using file storage");
            Arc::new(FileStorage::new(data_dir))
        }
        StorageChoice::S3(config) => {
            tracing::info!(bucket = %config.bucket, "using s3 storage");
            Arc::new(S3Storage::new(config).await)
        }
    };
    let geocoder = Arc::new(HttpGeocoder::new(args.geocoder_url.clone())?);
    let state = AppState::new(storage, geocoder);
    let backup_state = state.clone();

    let public_dir = args.public_dir();
    let index_file = public_dir.join("index.html");
    let app = api_router(state)
        .route_service("/e/{event_id}", ServeFile::new(index_file))
        .fallback_service(ServeDir::new(public_dir).append_index_html_on_directories(true))
        .layer(TraceLayer::new_for_http());

    let backup_every = Duration::from_secs(args.backup_interval_secs.max(1));
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(backup_every);
        loop {
            interval.tick().await;
            let saved = flush_dirty_boards(&backup_state).await;
            if saved > 0 {
                tracing::info!(saved, "periodic board backup");
            }
        }
    });

    let addr = SocketAddr::from(([0, 0, 0, 0], args.port));
    match (&args.tls_cert, &args.tls_key) {
        (Some(cert), Some(key)) => {
            let tls_config =
                axum_server::tls_rustls::RustlsConfig::from_pem_file(cert, key).await?;
            tracing::info!("floor-plan server listening on https://{addr}");
            axum_server::bind_rustls(addr, tls_config)
                .serve(app.into_make_service())
                .await?;
        }
        _ => {
            let listener = tokio::net::TcpListener::bind(addr).await?;
            tracing::info!("floor-plan server listening on http://{addr}");
            axum::serve(listener, app).await?;
        }
    }
    Ok(())
}
