// Application state for HTTP handlers
use crate::application::dashboard_runtime::DashboardHandle;
use crate::infrastructure::scene_map::SceneMap;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub dashboard: DashboardHandle,
    pub map: Arc<SceneMap>,
}
