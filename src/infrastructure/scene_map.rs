// In-memory map scene mirrored to the browser client
use crate::application::error::MapError;
use crate::application::map_surface::{Camera, FlyTo, ImageOverlay, MapSurface, MarkerSpec};
use async_trait::async_trait;
use serde::Serialize;
use std::sync::{Mutex, MutexGuard};
use tokio::sync::watch;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SceneMarker {
    #[serde(flatten)]
    pub spec: MarkerSpec,
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Scene {
    pub style_loaded: bool,
    pub overlays: Vec<ImageOverlay>,
    pub markers: Vec<SceneMarker>,
    pub camera: Camera,
    pub last_flight: Option<FlyTo>,
}

/// Registry of what is currently drawn. The client raises the style-ready
/// signal through [`SceneMap::mark_style_loaded`] once its base map has loaded.
pub struct SceneMap {
    scene: Mutex<Scene>,
    style_ready: watch::Sender<bool>,
}

impl SceneMap {
    pub fn new(camera: Camera) -> Self {
        let (style_ready, _) = watch::channel(false);
        Self {
            scene: Mutex::new(Scene {
                style_loaded: false,
                overlays: Vec::new(),
                markers: Vec::new(),
                camera,
                last_flight: None,
            }),
            style_ready,
        }
    }

    #[cfg(test)]
    pub fn ready() -> Self {
        use crate::application::map_surface::LngLat;
        let map = Self::new(Camera {
            center: LngLat { lon: 11.9746, lat: 57.7089 },
            zoom: 11.0,
        });
        map.mark_style_loaded();
        map
    }

    pub fn mark_style_loaded(&self) {
        self.lock().style_loaded = true;
        self.style_ready.send_replace(true);
    }

    pub fn snapshot(&self) -> Scene {
        self.lock().clone()
    }

    #[cfg(test)]
    pub fn overlay_count(&self) -> usize {
        self.lock().overlays.len()
    }

    #[cfg(test)]
    pub fn marker_count(&self) -> usize {
        self.lock().markers.len()
    }

    #[cfg(test)]
    pub fn active_markers(&self) -> Vec<String> {
        self.lock()
            .markers
            .iter()
            .filter(|m| m.active)
            .map(|m| m.spec.id.clone())
            .collect()
    }

    fn lock(&self) -> MutexGuard<'_, Scene> {
        self.scene.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl MapSurface for SceneMap {
    fn is_style_loaded(&self) -> bool {
        *self.style_ready.borrow()
    }

    async fn style_loaded(&self) {
        let mut rx = self.style_ready.subscribe();
        // the sender lives as long as self, so this only returns once ready
        let _ = rx.wait_for(|ready| *ready).await;
    }

    fn add_overlay(&self, overlay: ImageOverlay) -> Result<(), MapError> {
        let mut scene = self.lock();
        if scene.overlays.iter().any(|o| o.id == overlay.id) {
            return Err(MapError::DuplicateOverlay(overlay.id));
        }
        scene.overlays.push(overlay);
        Ok(())
    }

    fn remove_overlay(&self, id: &str) -> bool {
        let mut scene = self.lock();
        let before = scene.overlays.len();
        scene.overlays.retain(|o| o.id != id);
        scene.overlays.len() != before
    }

    fn add_marker(&self, marker: MarkerSpec) -> Result<(), MapError> {
        let mut scene = self.lock();
        if scene.markers.iter().any(|m| m.spec.id == marker.id) {
            return Err(MapError::DuplicateMarker(marker.id));
        }
        scene.markers.push(SceneMarker {
            spec: marker,
            active: false,
        });
        Ok(())
    }

    fn remove_marker(&self, id: &str) -> bool {
        let mut scene = self.lock();
        let before = scene.markers.len();
        scene.markers.retain(|m| m.spec.id != id);
        scene.markers.len() != before
    }

    fn set_marker_active(&self, id: &str, active: bool) {
        if let Some(marker) = self.lock().markers.iter_mut().find(|m| m.spec.id == id) {
            marker.active = active;
        }
    }

    fn camera(&self) -> Camera {
        self.lock().camera
    }

    fn fly_to(&self, target: FlyTo) {
        let mut scene = self.lock();
        scene.camera = Camera {
            center: target.center,
            zoom: target.zoom,
        };
        scene.last_flight = Some(target);
    }
}
