// HTTP request handlers - UI events in, render state out
use crate::application::dashboard::{DashboardEvent, DashboardView};
use crate::application::error::DashboardError;
use crate::application::focus_controller::ImageCardKind;
use crate::application::modal_controller::{Dismissal, ModalKind};
use crate::infrastructure::scene_map::Scene;
use crate::presentation::app_state::AppState;
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use std::sync::Arc;

#[derive(Deserialize)]
pub struct DayBody {
    pub day: u32,
}

#[derive(Deserialize)]
pub struct OverlayBody {
    pub enabled: bool,
}

#[derive(Deserialize)]
pub struct SensorsBody {
    pub visible: bool,
}

#[derive(Deserialize)]
pub struct KeyBody {
    pub key: String,
}

#[derive(Deserialize)]
pub struct DismissBody {
    #[serde(default = "default_dismissal")]
    pub via: Dismissal,
}

fn default_dismissal() -> Dismissal {
    Dismissal::Button
}

pub struct ApiError(DashboardError);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self.0 {
            DashboardError::UnknownDay(_) => StatusCode::BAD_REQUEST,
            DashboardError::Stopped => StatusCode::SERVICE_UNAVAILABLE,
            DashboardError::Map(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            tracing::error!(error = %self.0, "event handling failed");
        }
        (status, self.0.to_string()).into_response()
    }
}

async fn dispatch(state: &AppState, event: DashboardEvent) -> Result<StatusCode, ApiError> {
    state.dashboard.dispatch(event).await.map_err(ApiError)?;
    Ok(StatusCode::NO_CONTENT)
}

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "ok"
}

/// Full render state of the dashboard
pub async fn get_dashboard(
    State(state): State<Arc<AppState>>,
) -> Result<Json<DashboardView>, ApiError> {
    let view = state.dashboard.snapshot().await.map_err(ApiError)?;
    Ok(Json(view))
}

/// What is currently registered on the map
pub async fn get_scene(State(state): State<Arc<AppState>>) -> Json<Scene> {
    Json(state.map.snapshot())
}

pub async fn map_loaded(State(state): State<Arc<AppState>>) -> Result<StatusCode, ApiError> {
    state.map.mark_style_loaded();
    dispatch(&state, DashboardEvent::MapLoaded).await
}

pub async fn select_day(
    State(state): State<Arc<AppState>>,
    Json(body): Json<DayBody>,
) -> Result<StatusCode, ApiError> {
    dispatch(&state, DashboardEvent::DaySelected(body.day)).await
}

pub async fn toggle_overlay(
    State(state): State<Arc<AppState>>,
    Json(body): Json<OverlayBody>,
) -> Result<StatusCode, ApiError> {
    dispatch(&state, DashboardEvent::OverlayToggled(body.enabled)).await
}

pub async fn toggle_sensors(
    State(state): State<Arc<AppState>>,
    Json(body): Json<SensorsBody>,
) -> Result<StatusCode, ApiError> {
    dispatch(&state, DashboardEvent::SensorsToggled(body.visible)).await
}

pub async fn click_marker(
    Path(sensor_id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Result<StatusCode, ApiError> {
    dispatch(&state, DashboardEvent::MarkerClicked(sensor_id)).await
}

pub async fn click_background(State(state): State<Arc<AppState>>) -> Result<StatusCode, ApiError> {
    dispatch(&state, DashboardEvent::BackgroundClicked).await
}

pub async fn open_details(State(state): State<Arc<AppState>>) -> Result<StatusCode, ApiError> {
    dispatch(&state, DashboardEvent::DetailsRequested).await
}

pub async fn click_card(
    Path(card): Path<ImageCardKind>,
    State(state): State<Arc<AppState>>,
) -> Result<StatusCode, ApiError> {
    dispatch(&state, DashboardEvent::CardClicked(card)).await
}

pub async fn close_modal(
    Path(modal): Path<ModalKind>,
    State(state): State<Arc<AppState>>,
    body: Option<Json<DismissBody>>,
) -> Result<StatusCode, ApiError> {
    let via = body.map(|Json(b)| b.via).unwrap_or_else(default_dismissal);
    dispatch(&state, DashboardEvent::ModalDismissed(modal, via)).await
}

pub async fn press_key(
    State(state): State<Arc<AppState>>,
    Json(body): Json<KeyBody>,
) -> Result<StatusCode, ApiError> {
    dispatch(&state, DashboardEvent::KeyPressed(body.key)).await
}

pub async fn reload_feed(State(state): State<Arc<AppState>>) -> Result<StatusCode, ApiError> {
    dispatch(&state, DashboardEvent::ReloadFeed).await
}
