// Domain layer - feed rows, sensors and their color bands
pub mod aqi;
pub mod record;
pub mod sensor;
