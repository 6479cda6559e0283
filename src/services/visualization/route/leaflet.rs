//! Build a self contained Leaflet web page showing the route and clustered markers
use super::RouteMapRenderer;
use crate::config::FromServiceConfig;
use crate::gps::Route;
use crate::markers::Marker;
use crate::Error;
use log::debug;
use quick_xml::escape::escape;
use serde::Serialize;

const TEMPLATE: &str = r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1.0">
<title>__TITLE__</title>
<link rel="stylesheet" href="https://unpkg.com/leaflet@__LEAFLET__/dist/leaflet.css">
<link rel="stylesheet" href="https://unpkg.com/leaflet.markercluster@__CLUSTER__/dist/MarkerCluster.css">
<link rel="stylesheet" href="https://unpkg.com/leaflet.markercluster@__CLUSTER__/dist/MarkerCluster.Default.css">
<script src="https://unpkg.com/leaflet@__LEAFLET__/dist/leaflet.js"></script>
<script src="https://unpkg.com/leaflet.markercluster@__CLUSTER__/dist/leaflet.markercluster.js"></script>
<style>html, body, #map { height: 100%; margin: 0; }</style>
</head>
<body>
<div id="map"></div>
<script>
var data = __DATA__;
var map = L.map("map").setView(data.center, data.zoom);
L.tileLayer(data.tiles.url, { attribution: data.tiles.attribution, maxZoom: 19 }).addTo(map);
data.route.forEach(function (segment) {
  L.polyline(segment, { color: data.style.route_color, weight: data.style.route_weight }).addTo(map);
});
function markerLayer(markers, color) {
  var cluster = L.markerClusterGroup();
  markers.forEach(function (m) {
    L.circleMarker([m.lat, m.lon], { radius: data.style.marker_radius, color: color, fill: true })
      .bindPopup(m.popup)
      .bindTooltip(m.tooltip)
      .addTo(cluster);
  });
  return cluster.addTo(map);
}
var unmapped = markerLayer(data.unmapped, data.style.unmapped_color);
var mapped = markerLayer(data.mapped, data.style.mapped_color);
L.control.layers(null, { "Unmapped": unmapped, "Mapped": mapped }).addTo(map);
</script>
</body>
</html>
"#;

/// Defines the look of the generated map page
#[derive(Debug, FromServiceConfig)]
pub struct Leaflet {
    title: String,
    tile_url: String,
    attribution: String,
    leaflet_version: String,
    markercluster_version: String,
    zoom_start: u32,
    route_color: String,
    route_weight: u32,
    mapped_color: String,
    unmapped_color: String,
    marker_radius: u32,
}

impl Default for Leaflet {
    fn default() -> Self {
        Leaflet {
            title: "THC markers near route".to_string(),
            tile_url: "https://tile.openstreetmap.org/{z}/{x}/{y}.png".to_string(),
            attribution: "&copy; OpenStreetMap contributors".to_string(),
            leaflet_version: "1.9.4".to_string(),
            markercluster_version: "1.5.3".to_string(),
            zoom_start: 9,
            route_color: "blue".to_string(),
            route_weight: 4,
            mapped_color: "#2ECC71".to_string(),
            unmapped_color: "#E74C3C".to_string(),
            marker_radius: 5,
        }
    }
}

#[derive(Debug, Serialize)]
struct Tiles<'a> {
    url: &'a str,
    attribution: &'a str,
}

#[derive(Debug, Serialize)]
struct Style<'a> {
    route_color: &'a str,
    route_weight: u32,
    mapped_color: &'a str,
    unmapped_color: &'a str,
    marker_radius: u32,
}

/// A single circle marker as handed to the page script
#[derive(Debug, PartialEq, Serialize)]
pub struct MapMarker {
    lat: f64,
    lon: f64,
    tooltip: String,
    popup: String,
}

impl MapMarker {
    /// Markers without a position can't be drawn and give `None`
    fn new(marker: &Marker) -> Option<Self> {
        let location = marker.location()?;
        let popup = format!(
            "<b>{}</b><br>County: {}<br>HMDB: {}",
            escape(marker.name().unwrap_or("Unknown")),
            escape(marker.county().unwrap_or("")),
            escape(marker.cross_reference().map(str::trim).unwrap_or(""))
        );
        Some(MapMarker {
            lat: location.latitude(),
            lon: location.longitude(),
            tooltip: escape(marker.name().unwrap_or("Marker")).into_owned(),
            popup,
        })
    }
}

/// Markers split into the two toggleable groups of the map
#[derive(Debug, Default)]
pub struct MarkerLayers {
    pub mapped: Vec<MapMarker>,
    pub unmapped: Vec<MapMarker>,
}

/// Split markers by mapped status, using the same rule as the status filter
pub fn marker_layers(markers: &[&Marker]) -> MarkerLayers {
    let mut layers = MarkerLayers::default();
    for marker in markers {
        let map_marker = match MapMarker::new(marker) {
            Some(m) => m,
            None => continue,
        };
        if marker.is_mapped() {
            layers.mapped.push(map_marker);
        } else {
            layers.unmapped.push(map_marker);
        }
    }
    layers
}

#[derive(Debug, Serialize)]
struct MapData<'a> {
    center: [f64; 2],
    zoom: u32,
    tiles: Tiles<'a>,
    style: Style<'a>,
    /// one list of [lat, lon] pairs per route segment
    route: Vec<Vec<[f64; 2]>>,
    mapped: Vec<MapMarker>,
    unmapped: Vec<MapMarker>,
}

impl Leaflet {
    fn map_data(&self, route: &Route, markers: &[&Marker]) -> Result<String, Error> {
        let center = route.center().ok_or_else(|| {
            Error::InvalidGeometryError("cannot center a map on an empty route".to_string())
        })?;
        let layers = marker_layers(markers);
        debug!(
            "Drawing {} route segments, {} mapped and {} unmapped markers",
            route.num_segments(),
            layers.mapped.len(),
            layers.unmapped.len()
        );
        let data = MapData {
            center: [center.latitude(), center.longitude()],
            zoom: self.zoom_start,
            tiles: Tiles {
                url: &self.tile_url,
                attribution: &self.attribution,
            },
            style: Style {
                route_color: &self.route_color,
                route_weight: self.route_weight,
                mapped_color: &self.mapped_color,
                unmapped_color: &self.unmapped_color,
                marker_radius: self.marker_radius,
            },
            route: route
                .segments()
                .iter()
                .map(|line| line.0.iter().map(|c| [c.y, c.x]).collect())
                .collect(),
            mapped: layers.mapped,
            unmapped: layers.unmapped,
        };
        // a "</script>" inside any string would otherwise end the script block
        Ok(serde_json::to_string(&data)?.replace("</", "<\\/"))
    }
}

impl RouteMapRenderer for Leaflet {
    fn render_map(
        &self,
        route: &Route,
        markers: &[&Marker],
    ) -> Result<Vec<u8>, Box<dyn std::error::Error>> {
        let page = TEMPLATE
            .replace("__TITLE__", &escape(self.title.as_str()))
            .replace("__LEAFLET__", &self.leaflet_version)
            .replace("__CLUSTER__", &self.markercluster_version)
            .replace("__DATA__", &self.map_data(route, markers)?);
        Ok(page.into_bytes())
    }
}
