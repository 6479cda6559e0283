//! Module with GPS specific structures
use geo::{Coord, LineString, MultiLineString, Point};

/// Stores a single geospatial point
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Location {
    /// longitude coordinate in degrees
    longitude: f64,
    /// latitude coordinate in degrees
    latitude: f64,
}

impl Location {
    /// Create a location from WGS84 degrees, longitude first
    pub fn new(longitude: f64, latitude: f64) -> Self {
        Location {
            longitude,
            latitude,
        }
    }

    /// Return latitude in degrees
    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    /// Return longitude in degrees
    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    pub fn to_point(self) -> Point<f64> {
        Point::new(self.longitude, self.latitude)
    }
}

impl From<Coord<f64>> for Location {
    fn from(coord: Coord<f64>) -> Self {
        Location::new(coord.x, coord.y)
    }
}

/// A travel path made of one or more polylines in geographic degrees (x = longitude).
///
/// Segments are never joined, a multi-day trip with gaps stays a set of separate lines.
#[derive(Clone, Debug, PartialEq)]
pub struct Route {
    segments: MultiLineString<f64>,
}

impl Route {
    /// Wrap already validated segments, every segment must hold at least two vertices
    pub(crate) fn from_segments(segments: Vec<LineString<f64>>) -> Self {
        Route {
            segments: MultiLineString::new(segments),
        }
    }

    pub fn segments(&self) -> &[LineString<f64>] {
        &self.segments.0
    }

    pub fn as_multi_line_string(&self) -> &MultiLineString<f64> {
        &self.segments
    }

    pub fn num_segments(&self) -> usize {
        self.segments.0.len()
    }

    /// Total number of vertices across all segments
    pub fn num_vertices(&self) -> usize {
        self.segments.0.iter().map(|s| s.0.len()).sum()
    }

    /// The middle vertex of all segments' coordinates laid end to end, used to center maps
    pub fn center(&self) -> Option<Location> {
        let mid = self.num_vertices() / 2;
        self.segments
            .0
            .iter()
            .flat_map(|s| s.0.iter())
            .nth(mid)
            .map(|c| Location::from(*c))
    }
}
