// Focus controller - the single selected sensor and its detail panel
use crate::application::map_surface::{FlyTo, LngLat, MapSurface};
use crate::application::sensor_store::SensorStore;
use crate::infrastructure::config::{ImageSettings, MapSettings, render_template};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageCardKind {
    Forecast,
    Hindcast,
}

impl ImageCardKind {
    pub const ALL: [ImageCardKind; 2] = [ImageCardKind::Forecast, ImageCardKind::Hindcast];

    fn index(self) -> usize {
        match self {
            Self::Forecast => 0,
            Self::Hindcast => 1,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ImageCard {
    pub visible: bool,
    pub src: Option<String>,
    #[serde(skip)]
    generation: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FocusPanel {
    pub visible: bool,
    pub name: String,
    pub location: Option<String>,
    pub meta: String,
    pub details_enabled: bool,
    pub details_sensor_id: Option<String>,
}

/// Existence check for one card's image, tied to the card generation it was issued for.
#[derive(Debug, Clone, PartialEq)]
pub struct ProbeRequest {
    pub card: ImageCardKind,
    pub generation: u64,
    pub path: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProbeOutcome {
    pub request: ProbeRequest,
    pub exists: bool,
}

#[derive(Debug, Clone)]
pub struct FocusController {
    images: ImageSettings,
    min_zoom: f64,
    fly_speed: f64,
    active: Option<String>,
    panel: FocusPanel,
    cards: [ImageCard; 2],
}

impl FocusController {
    pub fn new(images: ImageSettings, map: &MapSettings) -> Self {
        Self {
            images,
            min_zoom: map.focus_min_zoom,
            fly_speed: map.fly_speed,
            active: None,
            panel: FocusPanel::default(),
            cards: Default::default(),
        }
    }

    pub fn active(&self) -> Option<&str> {
        self.active.as_deref()
    }

    pub fn panel(&self) -> &FocusPanel {
        &self.panel
    }

    pub fn card(&self, kind: ImageCardKind) -> &ImageCard {
        &self.cards[kind.index()]
    }

    /// Image shown on a card, if the card is currently visible.
    pub fn thumbnail(&self, kind: ImageCardKind) -> Option<&str> {
        let card = self.card(kind);
        card.visible.then_some(card.src.as_deref()).flatten()
    }

    pub fn image_path(&self, kind: ImageCardKind, sensor_id: &str) -> String {
        let template = match kind {
            ImageCardKind::Forecast => &self.images.forecast_template,
            ImageCardKind::Hindcast => &self.images.hindcast_template,
        };
        let encoded = urlencoding::encode(sensor_id);
        render_template(template, &[("sensor_id", encoded.as_ref())])
    }

    /// Focus a sensor. Unknown ids are ignored. Returns the image probes to run;
    /// their results go back through [`FocusController::apply_probe`].
    pub fn focus(
        &mut self,
        sensor_id: &str,
        store: &SensorStore,
        map: &dyn MapSurface,
    ) -> Vec<ProbeRequest> {
        let Some(entry) = store.get(sensor_id) else {
            tracing::debug!(sensor_id, "focus target not found");
            return Vec::new();
        };

        if let Some(previous) = self.active.as_deref() {
            if previous != sensor_id {
                map.set_marker_active(previous, false);
            }
        }
        map.set_marker_active(sensor_id, true);
        self.active = Some(sensor_id.to_string());

        self.panel = FocusPanel {
            visible: true,
            name: entry.display_name().to_string(),
            location: entry.location().map(str::to_string),
            meta: entry.coordinates_label(),
            details_enabled: !entry.rows.is_empty(),
            details_sensor_id: Some(entry.sensor_id.clone()),
        };

        let mut probes = Vec::with_capacity(ImageCardKind::ALL.len());
        for kind in ImageCardKind::ALL {
            let path = self.image_path(kind, sensor_id);
            let card = &mut self.cards[kind.index()];
            hide(card);
            probes.push(ProbeRequest {
                card: kind,
                generation: card.generation,
                path,
            });
        }

        let zoom = map.camera().zoom.max(self.min_zoom);
        map.fly_to(FlyTo {
            center: LngLat {
                lon: entry.lon,
                lat: entry.lat,
            },
            zoom,
            speed: self.fly_speed,
        });

        probes
    }

    /// Drop focus and reset the panel. Safe to call with nothing focused.
    pub fn clear(&mut self, map: &dyn MapSurface) {
        if let Some(previous) = self.active.take() {
            map.set_marker_active(&previous, false);
        }
        self.panel = FocusPanel::default();
        for card in &mut self.cards {
            hide(card);
        }
    }

    /// Show or hide a card from a finished probe. Results for a card that has
    /// been refocused or cleared since the probe was issued are discarded.
    pub fn apply_probe(&mut self, outcome: ProbeOutcome) -> bool {
        let request = outcome.request;
        let card = &mut self.cards[request.card.index()];
        if card.generation != request.generation {
            tracing::debug!(
                card = ?request.card,
                path = %request.path,
                "discarding stale image probe"
            );
            return false;
        }

        if outcome.exists {
            card.visible = true;
            card.src = Some(request.path);
        } else {
            card.visible = false;
            card.src = None;
        }
        true
    }
}

fn hide(card: &mut ImageCard) {
    card.generation += 1;
    card.visible = false;
    card.src = None;
}
