//! Tools for the Texas Historical Commission marker atlas: find markers near a travel
//! route, export them per county and keep OpenStreetMap in sync.
use std::path::PathBuf;

pub mod cli;
pub mod config;
pub mod counties;
mod error;
pub mod export;
pub mod gps;
pub mod hmdb;
pub mod markers;
pub mod nodes;
pub mod projection;
pub mod proximity;
pub mod services;
pub mod track;

pub use error::Error;
pub use gps::{Location, Route};
pub use markers::{Marker, MarkerTable, StatusFilter};

/// Return the path of the default configuration file
pub fn default_config_path() -> PathBuf {
    config_dir().join("config.yml")
}

/// Return the directory holding application configuration
pub fn config_dir() -> PathBuf {
    // fall back to the working directory on platforms without a config dir
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("thc-markers")
}
