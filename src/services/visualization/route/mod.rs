//! Draw a route and the markers found near it on an interactive map
use crate::config::{FromServiceConfig, ServiceConfig};
use crate::gps::Route;
use crate::markers::Marker;
use crate::Error;

mod leaflet;
pub use leaflet::{marker_layers, Leaflet, MarkerLayers};

/// trait that defines how to turn a route and its nearby markers into a map document
pub trait RouteMapRenderer {
    /// Render the complete map document
    fn render_map(
        &self,
        route: &Route,
        markers: &[&Marker],
    ) -> Result<Vec<u8>, Box<dyn std::error::Error>>;
}

/// Create a route map renderer from its configuration entry
pub fn new_route_visualization_handler(
    config: &ServiceConfig,
) -> Result<Box<dyn RouteMapRenderer>, Error> {
    match config.handler() {
        "leaflet" => Ok(Box::new(Leaflet::from_config(config)?)),
        _ => Err(Error::UnknownServiceHandler(format!(
            "unknown route_visualization handler: {}",
            config.handler()
        ))),
    }
}
