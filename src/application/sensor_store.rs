// Sensor store - groups feed rows by sensor id
use crate::domain::record::Record;
use crate::domain::sensor::SensorEntry;
use std::collections::HashMap;

const SENSOR_ID_COLUMNS: &[&str] = &["sensor_id", "sensorId"];
const LATITUDE_COLUMNS: &[&str] = &["latitude", "lat"];
const LONGITUDE_COLUMNS: &[&str] = &["longitude", "lon", "lng"];
const PREDICTED_COLUMNS: &[&str] = &["predicted_pm25", "predicted"];
const OBSERVED_COLUMNS: &[&str] = &["pm25"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ingested {
    Created,
    Appended,
    Dropped,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadSummary {
    pub rows: usize,
    pub sensors: usize,
    pub dropped: usize,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SensorStore {
    entries: HashMap<String, SensorEntry>,
    // first-seen order of sensor ids
    order: Vec<String>,
    headers: Vec<String>,
}

impl SensorStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A fresh store holding exactly `records`, ingested in order.
    pub fn from_records(records: Vec<Record>) -> (Self, LoadSummary) {
        let mut store = Self::new();
        let summary = store.load(records);
        (store, summary)
    }

    /// Reset, then ingest every record. Loading the same records twice yields equal stores.
    pub fn load(&mut self, records: Vec<Record>) -> LoadSummary {
        self.reset();
        self.headers = records
            .first()
            .map(|r| r.headers().to_vec())
            .unwrap_or_default();

        let mut summary = LoadSummary {
            rows: records.len(),
            ..LoadSummary::default()
        };
        for record in records {
            if self.ingest(record) == Ingested::Dropped {
                summary.dropped += 1;
            }
        }
        summary.sensors = self.entries.len();
        summary
    }

    pub fn reset(&mut self) {
        self.entries.clear();
        self.order.clear();
        self.headers.clear();
    }

    /// Add one row. Rows without a sensor id or finite coordinates are dropped.
    pub fn ingest(&mut self, record: Record) -> Ingested {
        let Some(sensor_id) = record.first_non_empty(SENSOR_ID_COLUMNS).map(str::to_string) else {
            return Ingested::Dropped;
        };
        let (Some(lat), Some(lon)) = (
            parse_finite(record.first_present(LATITUDE_COLUMNS)),
            parse_finite(record.first_present(LONGITUDE_COLUMNS)),
        ) else {
            return Ingested::Dropped;
        };

        let reading = parse_finite(record.first_present(PREDICTED_COLUMNS))
            .or_else(|| parse_finite(record.first_present(OBSERVED_COLUMNS)));

        match self.entries.get_mut(&sensor_id) {
            Some(entry) => {
                entry.rows.push(record);
                if reading.is_some() {
                    entry.latest_value = reading;
                }
                Ingested::Appended
            }
            None => {
                let mut entry = SensorEntry::new(sensor_id.clone(), lat, lon, record);
                entry.latest_value = reading;
                self.order.push(sensor_id.clone());
                self.entries.insert(sensor_id, entry);
                Ingested::Created
            }
        }
    }

    /// Entries in the order their sensor first appeared in the feed.
    pub fn all(&self) -> impl Iterator<Item = &SensorEntry> + '_ {
        self.order.iter().filter_map(|id| self.entries.get(id))
    }

    pub fn get(&self, sensor_id: &str) -> Option<&SensorEntry> {
        self.entries.get(sensor_id)
    }

    /// Header row of the last load.
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn parse_finite(raw: Option<&str>) -> Option<f64> {
    raw?.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}
