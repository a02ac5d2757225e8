// Modal controller - image viewer and per-sensor details table
use crate::domain::sensor::SensorEntry;
use serde::{Deserialize, Serialize};

/// Columns never shown in the details table.
const HIDDEN_COLUMNS: &[&str] = &[
    "longitude",
    "latitude",
    "sensor_id",
    "city_y",
    "city_x",
    "street",
    "country",
    "feed_url",
];

pub const ESCAPE_KEY: &str = "Escape";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModalKind {
    Image,
    Details,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dismissal {
    Button,
    Backdrop,
    Escape,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ImageModal {
    pub open: bool,
    pub src: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DetailsTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DetailsModal {
    pub open: bool,
    pub title: String,
    pub table: DetailsTable,
}

#[derive(Debug, Clone, Default)]
pub struct ModalController {
    image: ImageModal,
    details: DetailsModal,
}

impl ModalController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn image(&self) -> &ImageModal {
        &self.image
    }

    pub fn details(&self) -> &DetailsModal {
        &self.details
    }

    pub fn is_open(&self, kind: ModalKind) -> bool {
        match kind {
            ModalKind::Image => self.image.open,
            ModalKind::Details => self.details.open,
        }
    }

    pub fn open_image(&mut self, src: impl Into<String>) {
        self.image = ImageModal {
            open: true,
            src: Some(src.into()),
        };
    }

    /// Fill the details table from every row of `entry`. Entries without rows are ignored.
    pub fn open_details(&mut self, entry: &SensorEntry, headers: &[String]) -> bool {
        let Some(first) = entry.rows.first() else {
            return false;
        };
        let headers = if headers.is_empty() {
            first.headers()
        } else {
            headers
        };
        let columns: Vec<String> = headers
            .iter()
            .filter(|h| !HIDDEN_COLUMNS.contains(&h.as_str()))
            .cloned()
            .collect();
        let rows = entry
            .rows
            .iter()
            .map(|row| columns.iter().map(|c| row.cell(c)).collect())
            .collect();

        self.details = DetailsModal {
            open: true,
            title: entry.title(),
            table: DetailsTable { columns, rows },
        };
        true
    }

    /// Close one modal. The image source is released; details content stays, only hidden.
    pub fn dismiss(&mut self, kind: ModalKind, via: Dismissal) {
        if !self.is_open(kind) {
            return;
        }
        tracing::debug!(?kind, ?via, "closing modal");
        match kind {
            ModalKind::Image => {
                self.image.open = false;
                self.image.src = None;
            }
            ModalKind::Details => self.details.open = false,
        }
    }

    /// Escape closes every open modal; other keys do nothing. Returns how many closed.
    pub fn handle_key(&mut self, key: &str) -> usize {
        if key != ESCAPE_KEY {
            return 0;
        }
        let mut closed = 0;
        for kind in [ModalKind::Image, ModalKind::Details] {
            if self.is_open(kind) {
                self.dismiss(kind, Dismissal::Escape);
                closed += 1;
            }
        }
        closed
    }
}
