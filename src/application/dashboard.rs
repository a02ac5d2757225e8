// Dashboard - owns every controller and reacts to UI events and async completions
use crate::application::error::{DashboardError, FeedError};
use crate::application::focus_controller::{
    FocusController, FocusPanel, ImageCard, ImageCardKind, ProbeOutcome, ProbeRequest,
};
use crate::application::map_surface::{LngLat, MapSurface};
use crate::application::marker_controller::MarkerController;
use crate::application::modal_controller::{
    DetailsModal, Dismissal, ImageModal, ModalController, ModalKind,
};
use crate::application::raster_selector::{RasterPhase, RasterRequest, RasterSelector, day_label};
use crate::application::sensor_store::SensorStore;
use crate::domain::aqi::AqiColor;
use crate::infrastructure::config::DashboardConfig;
use crate::infrastructure::csv_table;
use serde::Serialize;
use std::sync::Arc;

#[derive(Debug)]
pub enum DashboardEvent {
    /// Base map finished loading: draw the current day, then load the feed.
    MapLoaded,
    DaySelected(u32),
    OverlayToggled(bool),
    SensorsToggled(bool),
    MarkerClicked(String),
    BackgroundClicked,
    DetailsRequested,
    CardClicked(ImageCardKind),
    ModalDismissed(ModalKind, Dismissal),
    KeyPressed(String),
    ReloadFeed,
    FeedFetched {
        generation: u64,
        result: Result<String, FeedError>,
    },
    StyleReady(RasterRequest),
    ImageProbed(ProbeOutcome),
}

/// Asynchronous work requested by the dashboard. Each completes with the
/// matching event carrying the token it was issued with.
#[derive(Debug, Clone, PartialEq)]
pub enum Task {
    FetchFeed { generation: u64 },
    AwaitStyle(RasterRequest),
    Probe(ProbeRequest),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarkerView {
    pub sensor_id: String,
    pub position: LngLat,
    pub color: AqiColor,
    pub fill: &'static str,
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardView {
    pub day: u32,
    pub day_label: String,
    pub forecast_days: Vec<u32>,
    pub overlay_enabled: bool,
    pub raster: RasterPhase,
    pub sensors_visible: bool,
    pub sensor_count: usize,
    pub markers: Vec<MarkerView>,
    pub focus: FocusPanel,
    pub forecast_card: ImageCard,
    pub hindcast_card: ImageCard,
    pub image_modal: ImageModal,
    pub details_modal: DetailsModal,
}

pub struct Dashboard {
    map: Arc<dyn MapSurface>,
    store: SensorStore,
    raster: RasterSelector,
    markers: MarkerController,
    focus: FocusController,
    modals: ModalController,
    feed_generation: u64,
}

impl Dashboard {
    pub fn new(config: &DashboardConfig, map: Arc<dyn MapSurface>) -> Self {
        Self {
            map,
            store: SensorStore::new(),
            raster: RasterSelector::new(config.raster.clone()),
            markers: MarkerController::new(),
            focus: FocusController::new(config.images.clone(), &config.map),
            modals: ModalController::new(),
            feed_generation: 0,
        }
    }

    pub fn map(&self) -> Arc<dyn MapSurface> {
        self.map.clone()
    }

    #[cfg(test)]
    pub fn store(&self) -> &SensorStore {
        &self.store
    }

    pub fn handle(&mut self, event: DashboardEvent) -> Result<Vec<Task>, DashboardError> {
        let mut tasks = Vec::new();
        match event {
            DashboardEvent::MapLoaded => {
                tasks.push(self.start_feed_load());
                let request = self.raster.reload(self.map.as_ref());
                match self.route_raster(request) {
                    Ok(task) => tasks.extend(task),
                    Err(e) => tracing::error!(error = %e, "failed to draw forecast raster"),
                }
            }
            DashboardEvent::DaySelected(day) => {
                let request = self.raster.set_day(day, self.map.as_ref())?;
                tasks.extend(self.route_raster(request)?);
            }
            DashboardEvent::OverlayToggled(enabled) => {
                let request = self.raster.set_enabled(enabled, self.map.as_ref());
                tasks.extend(self.route_raster(request)?);
            }
            DashboardEvent::SensorsToggled(visible) => {
                self.markers.set_visible(visible, self.map.as_ref())?;
                if !visible {
                    self.focus.clear(self.map.as_ref());
                }
            }
            DashboardEvent::MarkerClicked(sensor_id) => {
                // marker clicks never reach the background handler
                if self.markers.is_attached(&sensor_id) {
                    let probes = self.focus.focus(&sensor_id, &self.store, self.map.as_ref());
                    tasks.extend(probes.into_iter().map(Task::Probe));
                }
            }
            DashboardEvent::BackgroundClicked => self.focus.clear(self.map.as_ref()),
            DashboardEvent::DetailsRequested => self.open_details(),
            DashboardEvent::CardClicked(kind) => {
                if let Some(src) = self.focus.thumbnail(kind) {
                    let src = src.to_string();
                    self.modals.open_image(src);
                }
            }
            DashboardEvent::ModalDismissed(kind, via) => self.modals.dismiss(kind, via),
            DashboardEvent::KeyPressed(key) => {
                self.modals.handle_key(&key);
            }
            DashboardEvent::ReloadFeed => tasks.push(self.start_feed_load()),
            DashboardEvent::FeedFetched { generation, result } => {
                self.finish_feed_load(generation, result)?;
            }
            DashboardEvent::StyleReady(request) => {
                self.raster.apply(&request, self.map.as_ref())?;
            }
            DashboardEvent::ImageProbed(outcome) => {
                self.focus.apply_probe(outcome);
            }
        }
        Ok(tasks)
    }

    /// Apply a raster swap now if the style is ready, otherwise defer it.
    fn route_raster(
        &mut self,
        request: Option<RasterRequest>,
    ) -> Result<Option<Task>, DashboardError> {
        let Some(request) = request else {
            return Ok(None);
        };
        if self.map.is_style_loaded() {
            self.raster.apply(&request, self.map.as_ref())?;
            Ok(None)
        } else {
            Ok(Some(Task::AwaitStyle(request)))
        }
    }

    fn start_feed_load(&mut self) -> Task {
        self.feed_generation += 1;
        Task::FetchFeed {
            generation: self.feed_generation,
        }
    }

    /// Replace the store, markers and focus in one step. A failed or superseded
    /// load leaves everything as it was.
    fn finish_feed_load(
        &mut self,
        generation: u64,
        result: Result<String, FeedError>,
    ) -> Result<(), DashboardError> {
        if generation != self.feed_generation {
            tracing::debug!(
                generation,
                current = self.feed_generation,
                "discarding stale feed load"
            );
            return Ok(());
        }
        let text = match result {
            Ok(text) => text,
            Err(e) => {
                tracing::error!(error = %e, "failed to load predictions feed");
                return Ok(());
            }
        };

        let (store, summary) = SensorStore::from_records(csv_table::parse(&text));
        self.focus.clear(self.map.as_ref());
        self.store = store;
        self.markers.rebuild(self.store.all(), self.map.as_ref())?;

        tracing::info!(
            rows = summary.rows,
            sensors = summary.sensors,
            dropped = summary.dropped,
            "predictions feed loaded"
        );
        Ok(())
    }

    fn open_details(&mut self) {
        let panel = self.focus.panel();
        if !panel.details_enabled {
            return;
        }
        let Some(entry) = panel
            .details_sensor_id
            .as_deref()
            .and_then(|id| self.store.get(id))
        else {
            return;
        };
        self.modals.open_details(entry, self.store.headers());
    }

    pub fn view(&self) -> DashboardView {
        let active = self.focus.active();
        let markers = self
            .markers
            .markers()
            .iter()
            .map(|m| MarkerView {
                sensor_id: m.id.clone(),
                position: m.position,
                color: m.color,
                fill: m.color.hex(),
                active: active == Some(m.id.as_str()),
            })
            .collect();

        DashboardView {
            day: self.raster.day(),
            day_label: day_label(self.raster.day()),
            forecast_days: self.raster.forecast_days().to_vec(),
            overlay_enabled: self.raster.enabled(),
            raster: self.raster.phase(),
            sensors_visible: self.markers.visible(),
            sensor_count: self.store.len(),
            markers,
            focus: self.focus.panel().clone(),
            forecast_card: self.focus.card(ImageCardKind::Forecast).clone(),
            hindcast_card: self.focus.card(ImageCardKind::Hindcast).clone(),
            image_modal: self.modals.image().clone(),
            details_modal: self.modals.details().clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::error::MapError;
    use crate::application::map_surface::{Camera, FlyTo, ImageOverlay, MarkerSpec};
    use crate::infrastructure::scene_map::SceneMap;
    use async_trait::async_trait;

    /// Ready map that refuses every overlay.
    struct OverlayRejectingMap(SceneMap);

    #[async_trait]
    impl MapSurface for OverlayRejectingMap {
        fn is_style_loaded(&self) -> bool {
            true
        }

        async fn style_loaded(&self) {}

        fn add_overlay(&self, overlay: ImageOverlay) -> Result<(), MapError> {
            Err(MapError::DuplicateOverlay(overlay.id))
        }

        fn remove_overlay(&self, id: &str) -> bool {
            self.0.remove_overlay(id)
        }

        fn add_marker(&self, marker: MarkerSpec) -> Result<(), MapError> {
            self.0.add_marker(marker)
        }

        fn remove_marker(&self, id: &str) -> bool {
            self.0.remove_marker(id)
        }

        fn set_marker_active(&self, id: &str, active: bool) {
            self.0.set_marker_active(id, active)
        }

        fn camera(&self) -> Camera {
            self.0.camera()
        }

        fn fly_to(&self, target: FlyTo) {
            self.0.fly_to(target)
        }
    }

    const FEED: &str = "sensor_id,latitude,longitude,date,predicted_pm25,pm25,street,city_y\n\
                        A,57.70,11.97,2025-01-01,30,,Main,Gothenburg\n\
                        A,57.71,11.98,2025-01-02,,80,Main,Gothenburg\n\
                        B,57.60,11.90,2025-01-01,160,,,\n\
                        C,,11.90,2025-01-01,5,,,\n";

    fn dashboard() -> (Arc<SceneMap>, Dashboard) {
        let map = Arc::new(SceneMap::ready());
        let dashboard = Dashboard::new(&DashboardConfig::default(), map.clone());
        (map, dashboard)
    }

    fn feed_task(tasks: &[Task]) -> u64 {
        tasks
            .iter()
            .find_map(|t| match t {
                Task::FetchFeed { generation } => Some(*generation),
                _ => None,
            })
            .expect("feed task")
    }

    fn loaded() -> (Arc<SceneMap>, Dashboard) {
        let (map, mut dashboard) = dashboard();
        let tasks = dashboard.handle(DashboardEvent::MapLoaded).unwrap();
        let generation = feed_task(&tasks);
        dashboard
            .handle(DashboardEvent::FeedFetched {
                generation,
                result: Ok(FEED.to_string()),
            })
            .unwrap();
        (map, dashboard)
    }

    fn probes(tasks: Vec<Task>) -> Vec<ProbeRequest> {
        tasks
            .into_iter()
            .filter_map(|t| match t {
                Task::Probe(p) => Some(p),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_map_loaded_draws_raster_and_loads_feed() {
        let (map, dashboard) = loaded();
        assert_eq!(map.overlay_count(), 1);
        assert_eq!(map.marker_count(), 2);

        let view = dashboard.view();
        assert_eq!(view.sensor_count, 2);
        assert_eq!(view.raster, RasterPhase::Present(0));
        assert_eq!(view.day_label, "Today");
        let entry = dashboard.store().get("A").unwrap();
        assert_eq!((entry.lat, entry.lon), (57.70, 11.97));
        assert_eq!(entry.latest_value, Some(80.0));
        assert_eq!(view.markers[1].color, AqiColor::Red);
    }

    #[test]
    fn test_style_not_ready_defers_raster() {
        let map = Arc::new(SceneMap::new(Camera {
            center: LngLat { lon: 0.0, lat: 0.0 },
            zoom: 10.0,
        }));
        let mut dashboard = Dashboard::new(&DashboardConfig::default(), map.clone());

        let tasks = dashboard.handle(DashboardEvent::DaySelected(2)).unwrap();
        let Some(Task::AwaitStyle(request)) = tasks.into_iter().next() else {
            panic!("expected deferred raster swap");
        };
        assert_eq!(map.overlay_count(), 0);

        map.mark_style_loaded();
        dashboard.handle(DashboardEvent::StyleReady(request)).unwrap();
        assert_eq!(map.overlay_count(), 1);
        assert_eq!(dashboard.view().raster, RasterPhase::Present(2));
    }

    #[test]
    fn test_raster_never_doubles_up() {
        let (map, mut dashboard) = loaded();
        for event in [
            DashboardEvent::OverlayToggled(false),
            DashboardEvent::OverlayToggled(true),
            DashboardEvent::DaySelected(3),
            DashboardEvent::DaySelected(4),
        ] {
            dashboard.handle(event).unwrap();
            assert!(map.overlay_count() <= 1);
        }
        assert_eq!(map.overlay_count(), 1);
        assert_eq!(
            map.snapshot().overlays[0].url,
            "models/interpolation/forecast_interpolation_4d.png"
        );
    }

    #[test]
    fn test_unknown_day_is_a_caller_error() {
        let (_, mut dashboard) = loaded();
        assert_eq!(
            dashboard.handle(DashboardEvent::DaySelected(42)),
            Err(DashboardError::UnknownDay(42))
        );
        assert_eq!(dashboard.view().day, 0);
    }

    #[test]
    fn test_marker_click_focuses_and_background_clears() {
        let (map, mut dashboard) = loaded();
        let requests = probes(
            dashboard
                .handle(DashboardEvent::MarkerClicked("A".into()))
                .unwrap(),
        );
        assert_eq!(requests.len(), 2);
        dashboard
            .handle(DashboardEvent::MarkerClicked("B".into()))
            .unwrap();

        let view = dashboard.view();
        let active: Vec<&str> = view
            .markers
            .iter()
            .filter(|m| m.active)
            .map(|m| m.sensor_id.as_str())
            .collect();
        assert_eq!(active, ["B"]);
        assert_eq!(map.active_markers(), vec!["B".to_string()]);
        assert_eq!(view.focus.name, "B");

        dashboard.handle(DashboardEvent::BackgroundClicked).unwrap();
        assert!(!dashboard.view().focus.visible);
        assert!(map.active_markers().is_empty());
    }

    #[test]
    fn test_hiding_sensors_clears_focus_and_blocks_clicks() {
        let (map, mut dashboard) = loaded();
        dashboard
            .handle(DashboardEvent::MarkerClicked("A".into()))
            .unwrap();
        dashboard.handle(DashboardEvent::SensorsToggled(false)).unwrap();

        assert_eq!(map.marker_count(), 0);
        assert!(!dashboard.view().focus.visible);

        let tasks = dashboard
            .handle(DashboardEvent::MarkerClicked("A".into()))
            .unwrap();
        assert!(tasks.is_empty());
        assert!(!dashboard.view().focus.visible);
    }

    #[test]
    fn test_probe_after_clear_does_not_show_image() {
        let (_, mut dashboard) = loaded();
        let requests = probes(
            dashboard
                .handle(DashboardEvent::MarkerClicked("A".into()))
                .unwrap(),
        );
        dashboard.handle(DashboardEvent::BackgroundClicked).unwrap();

        for request in requests {
            dashboard
                .handle(DashboardEvent::ImageProbed(ProbeOutcome {
                    request,
                    exists: true,
                }))
                .unwrap();
        }
        let view = dashboard.view();
        assert!(!view.forecast_card.visible);
        assert!(!view.hindcast_card.visible);

        dashboard
            .handle(DashboardEvent::CardClicked(ImageCardKind::Forecast))
            .unwrap();
        assert!(!dashboard.view().image_modal.open);
    }

    #[test]
    fn test_card_click_opens_image_modal() {
        let (_, mut dashboard) = loaded();
        let requests = probes(
            dashboard
                .handle(DashboardEvent::MarkerClicked("A".into()))
                .unwrap(),
        );
        let forecast = requests
            .into_iter()
            .find(|r| r.card == ImageCardKind::Forecast)
            .unwrap();
        dashboard
            .handle(DashboardEvent::ImageProbed(ProbeOutcome {
                request: forecast,
                exists: true,
            }))
            .unwrap();
        dashboard
            .handle(DashboardEvent::CardClicked(ImageCardKind::Forecast))
            .unwrap();

        let view = dashboard.view();
        assert!(view.image_modal.open);
        assert_eq!(
            view.image_modal.src.as_deref(),
            Some("models/A/images/forecast.png")
        );
        assert!(!view.details_modal.open);
    }

    #[test]
    fn test_details_and_escape() {
        let (_, mut dashboard) = loaded();
        dashboard.handle(DashboardEvent::DetailsRequested).unwrap();
        assert!(!dashboard.view().details_modal.open);

        dashboard
            .handle(DashboardEvent::MarkerClicked("A".into()))
            .unwrap();
        dashboard.handle(DashboardEvent::DetailsRequested).unwrap();
        let view = dashboard.view();
        assert!(view.details_modal.open);
        assert_eq!(view.details_modal.table.columns, ["date", "predicted_pm25", "pm25"]);
        assert_eq!(view.details_modal.table.rows.len(), 2);

        dashboard
            .handle(DashboardEvent::KeyPressed("Escape".into()))
            .unwrap();
        assert!(!dashboard.view().details_modal.open);
    }

    #[test]
    fn test_reload_replaces_everything() {
        let (map, mut dashboard) = loaded();
        dashboard
            .handle(DashboardEvent::MarkerClicked("A".into()))
            .unwrap();

        let generation = feed_task(&dashboard.handle(DashboardEvent::ReloadFeed).unwrap());
        dashboard
            .handle(DashboardEvent::FeedFetched {
                generation,
                result: Ok("sensor_id,lat,lon,pm25\nZ,1,2,300".to_string()),
            })
            .unwrap();

        let view = dashboard.view();
        assert_eq!(view.sensor_count, 1);
        assert!(!view.focus.visible);
        assert_eq!(map.marker_count(), 1);
        assert_eq!(view.markers[0].color, AqiColor::Purple);
    }

    #[test]
    fn test_failed_or_stale_feed_keeps_store() {
        let (map, mut dashboard) = loaded();

        let stale = feed_task(&dashboard.handle(DashboardEvent::ReloadFeed).unwrap());
        let current = feed_task(&dashboard.handle(DashboardEvent::ReloadFeed).unwrap());

        dashboard
            .handle(DashboardEvent::FeedFetched {
                generation: current,
                result: Err(FeedError::Status(404)),
            })
            .unwrap();
        assert_eq!(dashboard.view().sensor_count, 2);

        dashboard
            .handle(DashboardEvent::FeedFetched {
                generation: stale,
                result: Ok("sensor_id,lat,lon\nZ,1,2".to_string()),
            })
            .unwrap();
        assert_eq!(dashboard.view().sensor_count, 2);
        assert_eq!(map.marker_count(), 2);
    }

    #[test]
    fn test_view_serializes_for_the_frontend() {
        let (_map, dashboard) = loaded();
        let json = serde_json::to_value(dashboard.view()).unwrap();

        assert_eq!(json["raster"], serde_json::json!({ "state": "present", "day": 0 }));
        assert_eq!(json["markers"][0]["sensor_id"], "A");
        assert_eq!(json["markers"][0]["color"], "yellow");
        assert_eq!(json["markers"][1]["color"], "red");
        assert_eq!(json["focus"]["visible"], false);
        assert!(json["forecast_card"].get("generation").is_none());
    }

    #[test]
    fn test_map_loaded_starts_feed_even_when_raster_fails() {
        let map = Arc::new(OverlayRejectingMap(SceneMap::ready()));
        let mut dashboard = Dashboard::new(&DashboardConfig::default(), map);

        let tasks = dashboard.handle(DashboardEvent::MapLoaded).unwrap();
        let generation = feed_task(&tasks);
        dashboard
            .handle(DashboardEvent::FeedFetched {
                generation,
                result: Ok(FEED.to_string()),
            })
            .unwrap();

        let view = dashboard.view();
        assert_eq!(view.sensor_count, 2);
        assert_eq!(view.raster, RasterPhase::Absent);
    }
}
