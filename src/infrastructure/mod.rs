// Infrastructure layer - External dependencies and adapters
pub mod config;
pub mod csv_table;
pub mod file_assets;
pub mod http_assets;
pub mod scene_map;
