// Marker controller - one colored marker per sensor
use crate::application::error::MapError;
use crate::application::map_surface::{LngLat, MapSurface, MarkerSpec, Popup};
use crate::domain::aqi::AqiColor;
use crate::domain::sensor::SensorEntry;

#[derive(Debug, Clone)]
pub struct MarkerController {
    markers: Vec<MarkerSpec>,
    visible: bool,
}

impl Default for MarkerController {
    fn default() -> Self {
        Self {
            markers: Vec::new(),
            visible: true,
        }
    }
}

impl MarkerController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn visible(&self) -> bool {
        self.visible
    }

    pub fn markers(&self) -> &[MarkerSpec] {
        &self.markers
    }

    /// Whether a click on this sensor's marker can happen at all.
    pub fn is_attached(&self, sensor_id: &str) -> bool {
        self.visible && self.markers.iter().any(|m| m.id == sensor_id)
    }

    /// Drop every managed marker and build one per entry, in order. New markers
    /// only reach the map while the sensor layer is visible.
    pub fn rebuild<'a>(
        &mut self,
        entries: impl IntoIterator<Item = &'a SensorEntry>,
        map: &dyn MapSurface,
    ) -> Result<(), MapError> {
        if self.visible {
            self.detach_all(map);
        }
        self.markers = entries.into_iter().map(marker_for).collect();
        if self.visible {
            self.attach_all(map)?;
        }
        tracing::debug!(markers = self.markers.len(), "markers rebuilt");
        Ok(())
    }

    /// Callers must clear focus when hiding; a focused marker has to stay visible.
    pub fn set_visible(&mut self, visible: bool, map: &dyn MapSurface) -> Result<(), MapError> {
        match (self.visible, visible) {
            (false, true) => self.attach_all(map)?,
            (true, false) => self.detach_all(map),
            _ => {}
        }
        self.visible = visible;
        Ok(())
    }

    fn attach_all(&self, map: &dyn MapSurface) -> Result<(), MapError> {
        for marker in &self.markers {
            map.add_marker(marker.clone())?;
        }
        Ok(())
    }

    fn detach_all(&self, map: &dyn MapSurface) {
        for marker in &self.markers {
            map.remove_marker(&marker.id);
        }
    }
}

pub fn marker_for(entry: &SensorEntry) -> MarkerSpec {
    MarkerSpec {
        id: entry.sensor_id.clone(),
        position: LngLat {
            lon: entry.lon,
            lat: entry.lat,
        },
        color: AqiColor::from_reading(entry.latest_value),
        popup: Popup {
            title: entry.display_name().to_string(),
            location: entry.location().map(str::to_string),
            reading: entry.reading_label(),
        },
    }
}
