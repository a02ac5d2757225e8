use crate::application::map_surface::{Bounds, LngLat};
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct DashboardConfig {
    pub server: ServerSettings,
    pub assets: AssetSettings,
    pub raster: RasterSettings,
    pub map: MapSettings,
    pub images: ImageSettings,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerSettings {
    pub bind: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:8080".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct AssetSettings {
    /// `http(s)://` base URL or a local directory.
    pub base: String,
    pub predictions_csv: String,
    pub timeout_secs: u64,
}

impl Default for AssetSettings {
    fn default() -> Self {
        Self {
            base: ".".to_string(),
            predictions_csv: "models/predictions.csv".to_string(),
            timeout_secs: 10,
        }
    }
}

impl AssetSettings {
    pub fn is_remote(&self) -> bool {
        self.base.starts_with("http://") || self.base.starts_with("https://")
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct RasterSettings {
    pub forecast_days: Vec<u32>,
    pub initial_day: u32,
    pub template: String,
    pub bounds: Bounds,
    pub opacity: f64,
}

impl Default for RasterSettings {
    fn default() -> Self {
        Self {
            forecast_days: (0..=7).collect(),
            initial_day: 0,
            template: "models/interpolation/forecast_interpolation_${day}d.png".to_string(),
            bounds: Bounds {
                west: 11.4,
                south: 57.15,
                east: 12.5,
                north: 58.25,
            },
            opacity: 0.75,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct MapSettings {
    pub center: LngLat,
    pub zoom: f64,
    pub focus_min_zoom: f64,
    pub fly_speed: f64,
}

impl Default for MapSettings {
    fn default() -> Self {
        Self {
            center: LngLat {
                lon: 11.9746,
                lat: 57.7089,
            },
            zoom: 11.0,
            focus_min_zoom: 11.0,
            fly_speed: 0.3,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ImageSettings {
    pub forecast_template: String,
    pub hindcast_template: String,
}

impl Default for ImageSettings {
    fn default() -> Self {
        Self {
            forecast_template: "models/${sensor_id}/images/forecast.png".to_string(),
            hindcast_template: "models/${sensor_id}/images/hindcast_prediction.png".to_string(),
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("raster.forecast_days must not be empty")]
    NoForecastDays,
    #[error("raster.initial_day {0} is not one of raster.forecast_days")]
    InitialDayOutOfRange(u32),
    #[error("raster.bounds must satisfy west < east and south < north")]
    InvalidBounds,
}

impl DashboardConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let raster = &self.raster;
        if raster.forecast_days.is_empty() {
            return Err(ConfigError::NoForecastDays);
        }
        if !raster.forecast_days.contains(&raster.initial_day) {
            return Err(ConfigError::InitialDayOutOfRange(raster.initial_day));
        }
        let b = &raster.bounds;
        if !(b.west < b.east && b.south < b.north) {
            return Err(ConfigError::InvalidBounds);
        }
        Ok(())
    }
}

/// `config/dashboard.*` layered with `PM25__SECTION__KEY` environment overrides.
pub fn load_dashboard_config() -> anyhow::Result<DashboardConfig> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name("config/dashboard").required(false))
        .add_source(
            config::Environment::with_prefix("PM25")
                .prefix_separator("__")
                .separator("__"),
        )
        .build()?;

    let config: DashboardConfig = settings.try_deserialize()?;
    config.validate()?;
    Ok(config)
}

/// Replace `${name}` placeholders in a path template
pub fn render_template(template: &str, vars: &[(&str, &str)]) -> String {
    let mut result = template.to_string();
    for (key, value) in vars {
        let placeholder = format!("${{{}}}", key);
        result = result.replace(&placeholder, value);
    }
    result
}
