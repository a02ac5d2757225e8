// Port to the map rendering engine (overlays, markers, camera)
use crate::application::error::MapError;
use crate::domain::aqi::AqiColor;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LngLat {
    pub lon: f64,
    pub lat: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub west: f64,
    pub south: f64,
    pub east: f64,
    pub north: f64,
}

impl Bounds {
    /// Top-left, top-right, bottom-right, bottom-left.
    pub fn corners(&self) -> [LngLat; 4] {
        [
            LngLat { lon: self.west, lat: self.north },
            LngLat { lon: self.east, lat: self.north },
            LngLat { lon: self.east, lat: self.south },
            LngLat { lon: self.west, lat: self.south },
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageOverlay {
    pub id: String,
    pub url: String,
    pub corners: [LngLat; 4],
    pub opacity: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Popup {
    pub title: String,
    pub location: Option<String>,
    pub reading: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarkerSpec {
    pub id: String,
    pub position: LngLat,
    pub color: AqiColor,
    pub popup: Popup,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Camera {
    pub center: LngLat,
    pub zoom: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FlyTo {
    pub center: LngLat,
    pub zoom: f64,
    pub speed: f64,
}

/// What the dashboard needs from the map engine. Ids are unique per kind.
#[async_trait]
pub trait MapSurface: Send + Sync {
    fn is_style_loaded(&self) -> bool;

    /// Resolves once the style and its resources are ready.
    async fn style_loaded(&self);

    fn add_overlay(&self, overlay: ImageOverlay) -> Result<(), MapError>;

    /// Returns whether an overlay with this id was present.
    fn remove_overlay(&self, id: &str) -> bool;

    fn add_marker(&self, marker: MarkerSpec) -> Result<(), MapError>;

    fn remove_marker(&self, id: &str) -> bool;

    fn set_marker_active(&self, id: &str, active: bool);

    fn camera(&self) -> Camera;

    fn fly_to(&self, target: FlyTo);
}
