//! Reproject geographic coordinates onto a planar metric coordinate system
//!
//! Distances between markers and the route are measured in spherical ("web") Mercator,
//! EPSG:3857, with longitude as x and latitude as y for both the route and every marker.
use crate::gps::{Location, Route};
use crate::Error;
use geo::{Coord, LineString, MapCoords, MultiLineString, Point};
use std::f64::consts::FRAC_PI_4;

/// Semi-major axis of the WGS84 ellipsoid used as the sphere radius by EPSG:3857
pub const EARTH_RADIUS_M: f64 = 6_378_137.0;

/// Latitudes beyond this limit are clamped, the projection diverges at the poles
pub const MAX_LATITUDE: f64 = 85.051_128_779_806_59;

/// A forward map projection from (longitude, latitude) degrees to planar meters
pub trait Projection {
    fn project(&self, coord: Coord<f64>) -> Coord<f64>;
}

/// Spherical Mercator as used by most web maps (EPSG:3857)
#[derive(Clone, Copy, Debug, Default)]
pub struct WebMercator;

impl Projection for WebMercator {
    fn project(&self, coord: Coord<f64>) -> Coord<f64> {
        let lat = coord.y.clamp(-MAX_LATITUDE, MAX_LATITUDE).to_radians();
        Coord {
            x: EARTH_RADIUS_M * coord.x.to_radians(),
            y: EARTH_RADIUS_M * (FRAC_PI_4 + lat / 2.0).tan().ln(),
        }
    }
}

/// Project a single polyline, an empty line is rejected
pub fn project_line_string<P: Projection>(
    projection: &P,
    line: &LineString<f64>,
) -> Result<LineString<f64>, Error> {
    if line.0.is_empty() {
        return Err(Error::InvalidGeometryError(
            "cannot project a line without coordinates".to_string(),
        ));
    }
    Ok(line.map_coords(|c| projection.project(c)))
}

/// Project every segment of a route, keeping one output line per input segment
pub fn project_route<P: Projection>(
    projection: &P,
    route: &Route,
) -> Result<MultiLineString<f64>, Error> {
    if route.num_segments() == 0 {
        return Err(Error::InvalidGeometryError(
            "cannot project a route without segments".to_string(),
        ));
    }
    let lines = route
        .segments()
        .iter()
        .map(|line| project_line_string(projection, line))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(MultiLineString::new(lines))
}

/// Project a single marker position
pub fn project_location<P: Projection>(projection: &P, location: Location) -> Point<f64> {
    Point::from(projection.project(Coord {
        x: location.longitude(),
        y: location.latitude(),
    }))
}
