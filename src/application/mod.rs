// Application layer - controllers and the ports they drive
pub mod asset_source;
pub mod dashboard;
pub mod dashboard_runtime;
pub mod error;
pub mod focus_controller;
pub mod map_surface;
pub mod marker_controller;
pub mod modal_controller;
pub mod raster_selector;
pub mod sensor_store;
