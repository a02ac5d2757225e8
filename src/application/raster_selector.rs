// Raster selector - keeps the day's forecast image overlay on the map
use crate::application::error::{DashboardError, MapError};
use crate::application::map_surface::{ImageOverlay, MapSurface};
use crate::infrastructure::config::{RasterSettings, render_template};
use serde::Serialize;

pub const OVERLAY_ID: &str = "pm25-interpolation";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "day", rename_all = "lowercase")]
pub enum RasterPhase {
    Absent,
    Present(u32),
}

/// A pending overlay swap, valid only while `generation` is current.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterRequest {
    pub generation: u64,
    pub day: u32,
    pub url: String,
}

#[derive(Debug, Clone)]
pub struct RasterSelector {
    settings: RasterSettings,
    day: u32,
    enabled: bool,
    generation: u64,
    phase: RasterPhase,
}

impl RasterSelector {
    pub fn new(settings: RasterSettings) -> Self {
        let day = settings.initial_day;
        Self {
            settings,
            day,
            enabled: true,
            generation: 0,
            phase: RasterPhase::Absent,
        }
    }

    pub fn day(&self) -> u32 {
        self.day
    }

    pub fn forecast_days(&self) -> &[u32] {
        &self.settings.forecast_days
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn phase(&self) -> RasterPhase {
        self.phase
    }

    pub fn url_for(&self, day: u32) -> String {
        render_template(&self.settings.template, &[("day", &day.to_string())])
    }

    /// Select a forecast day. Returns the swap to perform once the map style is ready,
    /// or `None` when the overlay is disabled.
    pub fn set_day(
        &mut self,
        day: u32,
        map: &dyn MapSurface,
    ) -> Result<Option<RasterRequest>, DashboardError> {
        if !self.settings.forecast_days.contains(&day) {
            return Err(DashboardError::UnknownDay(day));
        }
        self.day = day;
        Ok(self.refresh(map))
    }

    pub fn set_enabled(&mut self, enabled: bool, map: &dyn MapSurface) -> Option<RasterRequest> {
        self.enabled = enabled;
        self.refresh(map)
    }

    /// Request the overlay for the current day again.
    pub fn reload(&mut self, map: &dyn MapSurface) -> Option<RasterRequest> {
        self.refresh(map)
    }

    fn refresh(&mut self, map: &dyn MapSurface) -> Option<RasterRequest> {
        self.generation += 1;
        if !self.enabled {
            self.remove(map);
            return None;
        }
        Some(RasterRequest {
            generation: self.generation,
            day: self.day,
            url: self.url_for(self.day),
        })
    }

    /// Swap the overlay in one step: remove, then add. A request superseded by a
    /// later day change or toggle is discarded and `false` returned.
    pub fn apply(
        &mut self,
        request: &RasterRequest,
        map: &dyn MapSurface,
    ) -> Result<bool, MapError> {
        if request.generation != self.generation || !self.enabled {
            tracing::debug!(
                day = request.day,
                generation = request.generation,
                current = self.generation,
                "discarding stale raster request"
            );
            return Ok(false);
        }

        map.remove_overlay(OVERLAY_ID);
        self.phase = RasterPhase::Absent;
        map.add_overlay(ImageOverlay {
            id: OVERLAY_ID.to_string(),
            url: request.url.clone(),
            corners: self.settings.bounds.corners(),
            opacity: self.settings.opacity,
        })?;
        self.phase = RasterPhase::Present(request.day);

        tracing::info!(
            day = request.day,
            generation = request.generation,
            "raster overlay swapped"
        );
        Ok(true)
    }

    fn remove(&mut self, map: &dyn MapSurface) {
        map.remove_overlay(OVERLAY_ID);
        self.phase = RasterPhase::Absent;
    }
}

/// Slider caption for a forecast offset.
pub fn day_label(day: u32) -> String {
    match day {
        0 => "Today".to_string(),
        1 => "Tomorrow".to_string(),
        n => format!("Day {}", n),
    }
}
