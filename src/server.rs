use crate::config::AppConfig;
use crate::legend::Legend;
use crate::render::{MapView, ViewSummary};
use anyhow::{Context, Result};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::get,
    Router,
};
use geojson::FeatureCollection;
use serde_json::Value;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tracing::info;

pub struct AppState {
    pub views: Vec<MapView>,
}

impl AppState {
    fn view(&self, id: &str) -> Result<&MapView, StatusCode> {
        self.views.iter().find(|v| v.id == id).ok_or(StatusCode::NOT_FOUND)
    }
}

pub fn router(config: &AppConfig, views: Vec<MapView>) -> Router {
    let state = Arc::new(AppState { views });

    Router::new()
        .route("/api/maps", get(maps_handler))
        .route("/api/maps/:id/counties", get(counties_handler))
        .route("/api/maps/:id/schools", get(schools_handler))
        .route("/api/maps/:id/legend", get(legend_handler))
        .fallback_service(ServeDir::new(&config.output.dir))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn start_server(config: AppConfig, views: Vec<MapView>) -> Result<()> {
    let addr = SocketAddr::from(([127, 0, 0, 1], config.server.port));
    let app = router(&config, views);

    info!("Starting server on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(listener, app).await?;
    Ok(())
}

async fn maps_handler(State(state): State<Arc<AppState>>) -> Json<Value> {
    let summaries: Vec<ViewSummary<'_>> = state.views.iter().map(MapView::summary).collect();
    Json(serde_json::json!(summaries))
}

async fn counties_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<FeatureCollection>, StatusCode> {
    Ok(Json(state.view(&id)?.counties.clone()))
}

async fn schools_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<FeatureCollection>, StatusCode> {
    Ok(Json(state.view(&id)?.schools.clone()))
}

async fn legend_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Legend>, StatusCode> {
    Ok(Json(state.view(&id)?.legend.clone()))
}
