use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::{
    Router,
    routing::{delete, get, post},
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::service::SongService;
use crate::storage::SqliteStore;

pub mod routes;

/// Server state
pub struct AppState {
    pub service: SongService,
    pub external_api: String,
}

pub async fn start_server(
    port: u16,
    store: SqliteStore,
    external_api: String,
) -> anyhow::Result<()> {
    let state = Arc::new(AppState {
        service: SongService::new(Arc::new(Mutex::new(store))),
        external_api,
    });

    let app = Router::new()
        .route("/api/v1/songs", post(routes::add_song))
        .route(
            "/api/v1/songs/{id}",
            delete(routes::delete_song).put(routes::update_song),
        )
        .route("/api/v1/lyrics/{id}", get(routes::get_lyrics))
        .route("/api/v1/library", get(routes::get_library))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
