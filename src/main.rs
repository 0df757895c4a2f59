// Main entry point - Dependency injection and server setup
mod application;
mod domain;
mod infrastructure;
mod presentation;

use axum::{
    Router,
    routing::{get, post},
};
use std::{net::SocketAddr, sync::Arc};
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use crate::application::query_service::QueryService;
use crate::application::resource_cache::ResourceCache;
use crate::application::streaming_service::StreamingService;
use crate::infrastructure::config::load_config;
use crate::infrastructure::sitewise_http::HttpClientProvider;
use crate::presentation::app_state::AppState;
use crate::presentation::handlers::{health_check, query_data, stream_channel};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = load_config()?;
    let settings = &config.datasource;
    let instance_id = settings
        .instance_id
        .clone()
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

    // Infrastructure
    let clients = Arc::new(HttpClientProvider::from_settings(settings));
    let cache = Arc::new(ResourceCache::new(settings.cache_ttl()));
    let sweeper = cache.spawn_sweeper(settings.cache_sweep_interval());

    // Application
    let shutdown = CancellationToken::new();
    let query_service = Arc::new(QueryService::new(clients, cache, instance_id.clone()));
    let streaming_service = StreamingService::new(query_service.clone(), shutdown.clone());

    let state = Arc::new(AppState {
        query_service,
        streaming_service,
    });

    // Compression is applied per response and per stream chunk, so no
    // CompressionLayer here.
    let router = Router::new()
        .route("/health", get(health_check))
        .route("/query", post(query_data))
        .route("/stream/ds/:instance/:uid", get(stream_channel))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr: SocketAddr = config.server.bind_address.parse()?;
    tracing::info!(
        "Starting sitewise-datasource {} in region {} on {}",
        instance_id,
        settings.default_region,
        addr
    );

    let signal = shutdown.clone();
    axum::serve(tokio::net::TcpListener::bind(addr).await?, router)
        .with_graceful_shutdown(async move {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutting down, closing streams");
            signal.cancel();
        })
        .await?;

    sweeper.abort();
    Ok(())
}
