// Sensor domain model - all rows of the feed grouped under one sensor id
use super::record::Record;

#[derive(Debug, Clone, PartialEq)]
pub struct SensorEntry {
    pub sensor_id: String,
    pub lat: f64,
    pub lon: f64,
    pub city: String,
    pub street: String,
    pub latest_value: Option<f64>,
    pub rows: Vec<Record>,
}

impl SensorEntry {
    /// Starts an entry from the first row seen for `sensor_id`. Position and labels
    /// stay fixed afterwards.
    pub fn new(sensor_id: String, lat: f64, lon: f64, first_row: Record) -> Self {
        let city = first_row.cell("city_y");
        let street = first_row.cell("street");
        Self {
            sensor_id,
            lat,
            lon,
            city,
            street,
            latest_value: None,
            rows: vec![first_row],
        }
    }

    pub fn display_name(&self) -> &str {
        if self.street.is_empty() {
            &self.sensor_id
        } else {
            &self.street
        }
    }

    pub fn location(&self) -> Option<&str> {
        (!self.city.is_empty()).then_some(self.city.as_str())
    }

    /// "street, city", whichever parts exist, else the sensor id.
    pub fn title(&self) -> String {
        let parts: Vec<&str> = [self.street.as_str(), self.city.as_str()]
            .into_iter()
            .filter(|s| !s.is_empty())
            .collect();
        if parts.is_empty() {
            self.sensor_id.clone()
        } else {
            parts.join(", ")
        }
    }

    pub fn coordinates_label(&self) -> String {
        format!(
            "Lat {:.4}, Lon {:.4}, ID {}",
            self.lat, self.lon, self.sensor_id
        )
    }

    pub fn reading_label(&self) -> String {
        match self.latest_value {
            Some(value) => format!("PM2.5: {:.1}", value),
            None => "No recent value".to_string(),
        }
    }
}
