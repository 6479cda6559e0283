//! Combined GeoJSON feature collection holding the route and the nearby markers
use crate::gps::Route;
use crate::markers::{Marker, MarkerField, MarkerTable};
use geojson::{Feature, FeatureCollection, Geometry, JsonObject, JsonValue, Value};

fn position(x: f64, y: f64) -> Vec<f64> {
    vec![x, y]
}

/// The route as a single feature, a LineString for one segment and a MultiLineString
/// otherwise, in geographic coordinates
pub fn route_feature(route: &Route) -> Feature {
    let lines: Vec<Vec<Vec<f64>>> = route
        .segments()
        .iter()
        .map(|line| line.0.iter().map(|c| position(c.x, c.y)).collect())
        .collect();
    let value = if lines.len() == 1 {
        Value::LineString(lines.into_iter().flatten().collect())
    } else {
        Value::MultiLineString(lines)
    };
    let mut properties = JsonObject::new();
    properties.insert("name".to_string(), JsonValue::from("route"));
    Feature {
        bbox: None,
        geometry: Some(Geometry::new(value)),
        id: None,
        properties: Some(properties),
        foreign_members: None,
    }
}

fn property_value(marker: &Marker, field: &MarkerField) -> JsonValue {
    let text = marker.value(field);
    match field {
        _ if text.is_empty() => JsonValue::Null,
        MarkerField::Reference | MarkerField::CrossReference | MarkerField::NodeId => text
            .parse::<i64>()
            .map(JsonValue::from)
            .unwrap_or(JsonValue::Null),
        MarkerField::Latitude | MarkerField::Longitude => text
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .map(JsonValue::from)
            .unwrap_or(JsonValue::Null),
        _ => JsonValue::from(text),
    }
}

/// One point feature per marker, properties keyed by the table's headers
///
/// A marker without a position gets a feature with a null geometry.
pub fn marker_feature(marker: &Marker, headers: &[String], fields: &[MarkerField]) -> Feature {
    let properties: JsonObject = headers
        .iter()
        .zip(fields)
        .map(|(header, field)| (header.clone(), property_value(marker, field)))
        .collect();
    let geometry = marker
        .location()
        .map(|l| Geometry::new(Value::Point(position(l.longitude(), l.latitude()))));
    Feature {
        bbox: None,
        geometry,
        id: None,
        properties: Some(properties),
        foreign_members: None,
    }
}

/// Route first, followed by every marker in result order
pub fn route_feature_collection(
    route: &Route,
    table: &MarkerTable,
    markers: &[&Marker],
) -> FeatureCollection {
    let headers = super::table::full_headers(table);
    let fields: Vec<MarkerField> = headers.iter().map(|h| table.columns().resolve(h)).collect();
    let mut features = vec![route_feature(route)];
    features.extend(markers.iter().map(|m| marker_feature(m, &headers, &fields)));
    FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markers::Columns;
    use crate::track::parse_route;

    const TRACK: &str = "<kml><Placemark><LineString><coordinates>-97,33 -97,33.1</coordinates>\
        </LineString></Placemark><Placemark><LineString><coordinates>-95,30 -94.9,30\
        </coordinates></LineString></Placemark></kml>";

    const DATA: &str = "\
ref:US-TX:thc,ref:hmdb,name,addr:county,thc:Latitude,thc:Longitude
101,5001.0,Old Mill,Denton,33.05,-97.0
102,NaN,,Denton,33.06,-97.0
";

    #[test]
    fn collection_has_route_then_markers() {
        let route = parse_route(TRACK.as_bytes()).unwrap();
        let table = MarkerTable::from_reader(DATA.as_bytes(), &Columns::default()).unwrap();
        let markers: Vec<&Marker> = table.markers().iter().collect();
        let collection = route_feature_collection(&route, &table, &markers);
        assert_eq!(collection.features.len(), 3);

        let route_feature = &collection.features[0];
        assert_eq!(route_feature.property("name"), Some(&JsonValue::from("route")));
        match &route_feature.geometry.as_ref().unwrap().value {
            Value::MultiLineString(lines) => {
                assert_eq!(lines.len(), 2);
                assert_eq!(lines[1][0], vec![-95.0, 30.0]);
            }
            other => panic!("unexpected route geometry: {:?}", other),
        }

        let mill = &collection.features[1];
        assert_eq!(
            mill.geometry.as_ref().unwrap().value,
            Value::Point(vec![-97.0, 33.05])
        );
        assert_eq!(mill.property("ref:US-TX:thc"), Some(&JsonValue::from(101)));
        assert_eq!(mill.property("ref:hmdb"), Some(&JsonValue::from(5001)));
        assert_eq!(mill.property("OsmNodeID"), Some(&JsonValue::Null));
        assert_eq!(mill.property("thc:Latitude"), Some(&JsonValue::from(33.05)));

        let unmapped = &collection.features[2];
        assert_eq!(unmapped.property("ref:hmdb"), Some(&JsonValue::Null));
        assert_eq!(unmapped.property("name"), Some(&JsonValue::Null));
    }

    #[test]
    fn unlocated_marker_has_null_geometry() {
        let data = "ref:US-TX:thc,ref:hmdb,addr:county,thc:Latitude,thc:Longitude\n7,,Cooke,,-97.2\n";
        let table = MarkerTable::from_reader(data.as_bytes(), &Columns::default()).unwrap();
        let fields = table.fields();
        let feature = marker_feature(&table.markers()[0], table.headers(), &fields);
        assert!(feature.geometry.is_none());
        assert_eq!(feature.property("thc:Latitude"), Some(&JsonValue::Null));
        assert_eq!(feature.property("thc:Longitude"), Some(&JsonValue::from(-97.2)));
        assert_eq!(feature.property("ref:US-TX:thc"), Some(&JsonValue::from(7)));
    }

    #[test]
    fn single_segment_is_a_line_string() {
        let route = parse_route(
            "<kml><coordinates>-97,33 -97,33.1</coordinates></kml>".as_bytes(),
        )
        .unwrap();
        match route_feature(&route).geometry.unwrap().value {
            Value::LineString(coords) => assert_eq!(coords.len(), 2),
            other => panic!("unexpected route geometry: {:?}", other),
        }
    }
}
