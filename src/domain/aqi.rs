// Air quality index color bands
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AqiColor {
    Green,
    Yellow,
    Orange,
    Red,
    Purple,
}

impl AqiColor {
    /// Step function over the reading; band upper bounds are inclusive.
    pub fn from_value(value: f64) -> Self {
        if value <= 50.0 {
            Self::Green
        } else if value <= 100.0 {
            Self::Yellow
        } else if value <= 150.0 {
            Self::Orange
        } else if value <= 200.0 {
            Self::Red
        } else {
            Self::Purple
        }
    }

    /// Sensors without any reading are drawn as if they read zero.
    pub fn from_reading(reading: Option<f64>) -> Self {
        Self::from_value(reading.unwrap_or(0.0))
    }

    pub fn hex(self) -> &'static str {
        match self {
            Self::Green => "#00e400",
            Self::Yellow => "#ffff00",
            Self::Orange => "#ff7e00",
            Self::Red => "#ff0000",
            Self::Purple => "#8f3f97",
        }
    }
}
