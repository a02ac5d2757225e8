// Main entry point - Dependency injection and server setup
mod application;
mod domain;
mod infrastructure;
mod presentation;

use std::{net::SocketAddr, sync::Arc, time::Duration};
use axum::{
    Router,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use crate::application::asset_source::{FeedSource, ResourceProbe};
use crate::application::dashboard::Dashboard;
use crate::application::dashboard_runtime::spawn_dashboard;
use crate::application::map_surface::Camera;
use crate::infrastructure::config::load_dashboard_config;
use crate::infrastructure::file_assets::FileAssets;
use crate::infrastructure::http_assets::HttpAssets;
use crate::infrastructure::scene_map::SceneMap;
use crate::presentation::app_state::AppState;
use crate::presentation::handlers::{
    click_background, click_card, click_marker, close_modal, get_dashboard, get_scene,
    health_check, map_loaded, open_details, press_key, reload_feed, select_day, toggle_overlay,
    toggle_sensors,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Load configuration
    let config = load_dashboard_config()?;

    // Asset adapters (infrastructure layer)
    let remote = config.assets.is_remote();
    let (feed, probe): (Arc<dyn FeedSource>, Arc<dyn ResourceProbe>) = if remote {
        let assets = Arc::new(HttpAssets::new(
            &config.assets.base,
            &config.assets.predictions_csv,
            Duration::from_secs(config.assets.timeout_secs),
        )?);
        (assets.clone() as Arc<dyn FeedSource>, assets as Arc<dyn ResourceProbe>)
    } else {
        let assets = Arc::new(FileAssets::new(&config.assets.base, &config.assets.predictions_csv));
        (assets.clone() as Arc<dyn FeedSource>, assets as Arc<dyn ResourceProbe>)
    };

    let map = Arc::new(SceneMap::new(Camera {
        center: config.map.center,
        zoom: config.map.zoom,
    }));

    // Dashboard task (application layer)
    let dashboard = Dashboard::new(&config, map.clone());
    let handle = spawn_dashboard(dashboard, feed, probe);

    let state = Arc::new(AppState {
        dashboard: handle,
        map,
    });

    // Build router (presentation layer)
    let router = Router::new()
        .route("/healthz", get(health_check))
        .route("/dashboard", get(get_dashboard))
        .route("/map/scene", get(get_scene))
        .route("/events/map-loaded", post(map_loaded))
        .route("/events/day", post(select_day))
        .route("/events/overlay", post(toggle_overlay))
        .route("/events/sensors", post(toggle_sensors))
        .route("/events/markers/:sensor_id/click", post(click_marker))
        .route("/events/background/click", post(click_background))
        .route("/events/focus/details", post(open_details))
        .route("/events/cards/:card/click", post(click_card))
        .route("/events/modals/:modal/close", post(close_modal))
        .route("/events/key", post(press_key))
        .route("/feed/reload", post(reload_feed))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    // Start server
    let addr: SocketAddr = config.server.bind.parse()?;
    tracing::info!(%addr, assets = %config.assets.base, "starting pm25-forecast-map");

    axum::serve(tokio::net::TcpListener::bind(addr).await?, router).await?;

    Ok(())
}
