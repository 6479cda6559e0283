//! Find the markers that lie within a given distance of a route
use crate::gps::Route;
use crate::markers::{Marker, MarkerTable, StatusFilter};
use crate::projection::{project_location, project_route, Projection};
use crate::Error;
use geo::{EuclideanDistance, MultiLineString, Point};
use log::{debug, info, warn};

/// Fixed meters to miles conversion shared by every distance computation
pub const METERS_PER_MILE: f64 = 1609.34;

/// Check that a search radius is a positive, finite number of miles
///
/// Zero is rejected as well, a marker sitting exactly on the route is still found by any
/// positive radius since membership is inclusive.
pub fn validate_radius(radius_miles: f64) -> Result<f64, Error> {
    if radius_miles.is_finite() && radius_miles > 0.0 {
        Ok(radius_miles)
    } else {
        Err(Error::InvalidRadiusError(radius_miles))
    }
}

/// Decides route membership for points in the same planar projection as the route
#[derive(Clone, Debug)]
pub struct ProximityClassifier {
    route: MultiLineString<f64>,
    radius_miles: f64,
}

impl ProximityClassifier {
    /// Create a classifier for an already projected route
    pub fn new(route: MultiLineString<f64>, radius_miles: f64) -> Result<Self, Error> {
        Ok(ProximityClassifier {
            route,
            radius_miles: validate_radius(radius_miles)?,
        })
    }

    pub fn radius_miles(&self) -> f64 {
        self.radius_miles
    }

    /// Shortest planar distance from the point to any segment of any route line
    pub fn distance_meters(&self, point: &Point<f64>) -> f64 {
        self.route
            .0
            .iter()
            .map(|line| point.euclidean_distance(line))
            .fold(f64::INFINITY, f64::min)
    }

    pub fn distance_miles(&self, point: &Point<f64>) -> f64 {
        self.distance_meters(point) / METERS_PER_MILE
    }

    /// Membership is inclusive, a point exactly `radius` miles away is near the route
    pub fn contains(&self, point: &Point<f64>) -> bool {
        self.distance_miles(point) <= self.radius_miles
    }
}

/// Markers found near a route for one run of the route command
#[derive(Debug)]
pub struct ProximityResult<'a> {
    route: &'a Route,
    markers: Vec<&'a Marker>,
    radius_miles: f64,
    filter: StatusFilter,
}

impl<'a> ProximityResult<'a> {
    pub fn new(
        route: &'a Route,
        markers: Vec<&'a Marker>,
        radius_miles: f64,
        filter: StatusFilter,
    ) -> Self {
        ProximityResult {
            route,
            markers,
            radius_miles,
            filter,
        }
    }

    pub fn route(&self) -> &'a Route {
        self.route
    }

    pub fn markers(&self) -> &[&'a Marker] {
        &self.markers
    }

    pub fn radius_miles(&self) -> f64 {
        self.radius_miles
    }

    pub fn filter(&self) -> StatusFilter {
        self.filter
    }

    /// Status tag embedded in output file names
    pub fn tag(&self) -> &'static str {
        self.filter.tag()
    }

    pub fn len(&self) -> usize {
        self.markers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }

    pub fn mapped_count(&self) -> usize {
        self.markers.iter().filter(|m| m.is_mapped()).count()
    }
}

/// Apply the status filter and keep markers within `radius_miles` of the route
///
/// Markers without a usable position can never be near the route and are left out.
pub fn find_markers_near_route<'a, P: Projection>(
    projection: &P,
    route: &'a Route,
    table: &'a MarkerTable,
    filter: StatusFilter,
    radius_miles: f64,
) -> Result<ProximityResult<'a>, Error> {
    let radius_miles = validate_radius(radius_miles)?;
    let candidates = table.select(filter);
    let classifier = ProximityClassifier::new(project_route(projection, route)?, radius_miles)?;

    let unlocated = candidates.iter().filter(|m| !m.is_located()).count();
    if unlocated > 0 {
        warn!(
            "Ignoring {} markers with missing or non-numeric coordinates",
            unlocated
        );
    }
    let near: Vec<&Marker> = candidates
        .into_iter()
        .filter(|m| {
            m.location()
                .map(|l| classifier.contains(&project_location(projection, l)))
                .unwrap_or(false)
        })
        .collect();
    debug!(
        "{} markers with status '{}' are within {} miles of the route",
        near.len(),
        filter,
        radius_miles
    );
    info!(
        "Found {} markers within {} miles ({})",
        near.len(),
        radius_miles,
        filter
    );

    Ok(ProximityResult::new(route, near, radius_miles, filter))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gps::Location;
    use crate::markers::Columns;
    use crate::projection::WebMercator;
    use approx::assert_relative_eq;
    use geo::LineString;

    fn straight_route() -> Route {
        Route::from_segments(vec![LineString::from(vec![(-97.0, 33.0), (-97.0, 33.1)])])
    }

    fn classifier(route: &Route, radius: f64) -> ProximityClassifier {
        ProximityClassifier::new(project_route(&WebMercator, route).unwrap(), radius).unwrap()
    }

    fn point(lon: f64, lat: f64) -> Point<f64> {
        project_location(&WebMercator, Location::new(lon, lat))
    }

    #[test]
    fn non_positive_radius_is_rejected() {
        for radius in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            assert!(matches!(
                validate_radius(radius),
                Err(Error::InvalidRadiusError(_))
            ));
        }
        assert_eq!(validate_radius(0.25).unwrap(), 0.25);
    }

    #[test]
    fn route_vertices_are_at_distance_zero() {
        let c = classifier(&straight_route(), 5.0);
        assert_relative_eq!(c.distance_meters(&point(-97.0, 33.05)), 0.0, epsilon = 1e-6);
        assert!(c.contains(&point(-97.0, 33.05)));
    }

    #[test]
    fn boundary_is_inclusive() {
        let route = straight_route();
        let marker = point(-96.95, 33.05);
        let exact = classifier(&route, 1.0).distance_miles(&marker);
        assert!(classifier(&route, exact).contains(&marker));
        // the same marker is outside a radius one epsilon smaller
        let smaller = exact * (1.0 - 1e-12);
        assert!(!classifier(&route, smaller).contains(&marker));
    }

    #[test]
    fn scenario_five_mile_radius() {
        let c = classifier(&straight_route(), 5.0);
        assert!(c.contains(&point(-97.0, 33.05)));
        // roughly 30 miles east on the ground, more in Mercator meters
        assert!(!c.contains(&point(-96.5, 33.05)));
        assert!(c.distance_miles(&point(-96.5, 33.05)) > 25.0);
    }

    #[test]
    fn disconnected_segments_are_not_joined() {
        let route = Route::from_segments(vec![
            LineString::from(vec![(-100.0, 30.0), (-99.9, 30.0)]),
            LineString::from(vec![(-95.0, 30.0), (-94.9, 30.0)]),
        ]);
        let c = classifier(&route, 5.0);
        // halfway across the gap, joining the segments would put this on the route
        let gap = point(-97.5, 30.0);
        assert!(!c.contains(&gap));
        assert!(c.distance_miles(&gap) > 100.0);

        // each marker is measured against whichever segment is nearer
        let near_second = point(-94.95, 30.01);
        let only_second = classifier(
            &Route::from_segments(vec![route.segments()[1].clone()]),
            5.0,
        );
        assert_relative_eq!(
            c.distance_meters(&near_second),
            only_second.distance_meters(&near_second)
        );
        assert!(c.contains(&near_second));
    }

    #[test]
    fn find_markers_applies_filter_then_distance() {
        let data = "\
ref:US-TX:thc,ref:hmdb,name,addr:county,thc:Latitude,thc:Longitude
1,100,On route mapped,Denton,33.05,-97.0
2, NaN ,On route unmapped,Denton,33.02,-97.01
3,,Far away,Denton,33.05,-96.5
4,,Bad row,Denton,,-96.5
";
        let table = MarkerTable::from_reader(data.as_bytes(), &Columns::default()).unwrap();
        let route = straight_route();

        let all =
            find_markers_near_route(&WebMercator, &route, &table, StatusFilter::All, 5.0).unwrap();
        let refs: Vec<_> = all.markers().iter().filter_map(|m| m.reference()).collect();
        assert_eq!(refs, vec![1, 2]);
        // the row without a latitude stays in the table but is never near the route
        assert_eq!(table.len(), 4);
        assert!(all.markers().iter().all(|m| m.is_located()));
        assert_eq!(all.tag(), "all");
        assert_eq!(all.mapped_count(), 1);

        let unmapped =
            find_markers_near_route(&WebMercator, &route, &table, StatusFilter::UnmappedOnly, 5.0)
                .unwrap();
        assert_eq!(unmapped.len(), 1);
        assert_eq!(unmapped.markers()[0].reference(), Some(2));
        assert!(!unmapped.markers()[0].is_mapped());

        assert!(matches!(
            find_markers_near_route(&WebMercator, &route, &table, StatusFilter::All, 0.0),
            Err(Error::InvalidRadiusError(_))
        ));
    }
}
