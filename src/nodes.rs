//! OpenStreetMap nodes built from marker records and the bookkeeping around them
use crate::export::write_atomic;
use crate::markers::{is_truthy, parse_nullable_int, MarkerTable};
use crate::Error;
use chrono::NaiveDate;
use geojson::{GeoJson, JsonValue};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

/// OSM tag carrying the THC marker number
pub const THC_REF_TAG: &str = "ref:US-TX:thc";

/// Tags shared by every THC marker node
const FIXED_TAGS: [(&str, &str); 7] = [
    ("historic", "memorial"),
    ("memorial", "plaque"),
    ("material", "aluminium"),
    ("support", "pole"),
    ("operator", "Texas Historical Commission"),
    ("operator:wikidata", "Q2397965"),
    ("thc:designation", "Historical Marker"),
];

/// A node ready to be added to the map
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OsmNode {
    pub lat: f64,
    pub lon: f64,
    pub tags: BTreeMap<String, String>,
}

impl OsmNode {
    pub fn new(lat: f64, lon: f64) -> Self {
        OsmNode {
            lat,
            lon,
            tags: BTreeMap::new(),
        }
    }

    /// Set a tag, blank values are ignored
    pub fn set_tag(&mut self, key: &str, value: &str) {
        let value = value.trim();
        if !value.is_empty() {
            self.tags.insert(key.to_string(), value.to_string());
        }
    }

    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags.get(key).map(|v| v.as_str())
    }

    /// THC marker number of this node
    pub fn reference(&self) -> Option<i64> {
        self.tag(THC_REF_TAG).and_then(parse_nullable_int)
    }

    /// Tags as `key=value` pairs joined with `|`, the form the editor expects
    pub fn tag_string(&self) -> String {
        self.tags
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<String>>()
            .join("|")
    }
}

/// Build one node per marker that has a THC reference number and a position
pub fn create_nodes(table: &MarkerTable) -> Vec<OsmNode> {
    let columns = table.columns();
    let mut nodes = Vec::new();
    for marker in table.markers() {
        let reference = match marker.reference() {
            Some(r) => r,
            None => {
                warn!(
                    "Skipping marker {:?} without a THC reference number",
                    marker.name().unwrap_or("Unknown")
                );
                continue;
            }
        };
        let location = match marker.location() {
            Some(l) => l,
            None => {
                warn!(
                    "Skipping marker {} without usable coordinates",
                    reference
                );
                continue;
            }
        };
        let mut node = OsmNode::new(location.latitude(), location.longitude());
        for (key, value) in FIXED_TAGS.iter() {
            node.set_tag(key, value);
        }
        node.set_tag("name", marker.name().unwrap_or(""));
        node.set_tag(THC_REF_TAG, &reference.to_string());
        if let Some(start_date) = marker.extra(&columns.start_date) {
            let start_date = parse_nullable_int(start_date)
                .map(|y| y.to_string())
                .unwrap_or_else(|| start_date.to_string());
            node.set_tag("start_date", &start_date);
        }
        if let Some(website) = marker.extra(&columns.website) {
            node.set_tag("source:website", website);
        }
        if let Some(hmdb) = marker.cross_reference().and_then(parse_nullable_int) {
            node.set_tag("ref:hmdb", &hmdb.to_string());
            node.set_tag(
                "memorial:website",
                &format!("https://www.hmdb.org/m.asp?m={}", hmdb),
            );
        }
        nodes.push(node);
    }
    debug!("Created {} nodes from {} markers", nodes.len(), table.len());
    nodes
}

/// Read nodes previously written by [`save_nodes`]
pub fn load_nodes(path: &Path) -> Result<Vec<OsmNode>, Error> {
    let fp = File::open(path)?;
    Ok(serde_json::from_reader(BufReader::new(fp))?)
}

pub fn save_nodes(path: &Path, nodes: &[OsmNode]) -> Result<(), Error> {
    write_atomic(path, |w| Ok(serde_json::to_writer_pretty(w, nodes)?))
}

fn reference_from_json(value: &JsonValue) -> Option<i64> {
    match value {
        JsonValue::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().and_then(|v| parse_nullable_int(&v.to_string()))),
        JsonValue::String(s) => parse_nullable_int(s),
        _ => None,
    }
}

/// THC reference numbers tagged on the features of an OSM extract
pub fn osm_references(geojson: &GeoJson) -> BTreeSet<i64> {
    let features = match geojson {
        GeoJson::FeatureCollection(fc) => fc.features.as_slice(),
        GeoJson::Feature(f) => std::slice::from_ref(f),
        GeoJson::Geometry(_) => &[][..],
    };
    features
        .iter()
        .filter_map(|f| f.property(THC_REF_TAG))
        .filter_map(reference_from_json)
        .collect()
}

pub fn load_geojson(path: &Path) -> Result<GeoJson, Error> {
    let fp = File::open(path)?;
    Ok(GeoJson::from_reader(BufReader::new(fp))?)
}

/// Markers in the table whose THC reference does not appear in the OSM extract, sorted
pub fn find_missing_osm(table: &MarkerTable, geojson: &GeoJson) -> Vec<i64> {
    let osm = osm_references(geojson);
    let table_refs: BTreeSet<i64> = table.markers().iter().filter_map(|m| m.reference()).collect();
    let missing: Vec<i64> = table_refs.difference(&osm).copied().collect();
    info!("Missing markers in OSM: {}", missing.len());
    missing
}

/// Flag every marker whose reference is in `references` as present in OSM
///
/// Returns how many flags changed, markers already flagged are not counted.
pub fn update_osm_flags(table: &mut MarkerTable, references: &HashSet<i64>) -> usize {
    let column = table.columns().is_osm.clone();
    table.ensure_column(&column);
    let mut changed = 0;
    for marker in table.markers_mut() {
        let listed = marker
            .reference()
            .map(|r| references.contains(&r))
            .unwrap_or(false);
        if listed && !marker.extra(&column).map(is_truthy).unwrap_or(false) {
            marker.set_extra(&column, "True");
            changed += 1;
        }
    }
    info!("Updated {} markers as OSM-present", changed);
    changed
}

/// Location of a dated copy of `path`: `file_backup/<YYYYMMDD>_<name>` next to it
pub fn dated_backup_path(path: &Path, date: NaiveDate) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let dir = path.parent().unwrap_or_else(|| Path::new(""));
    dir.join("file_backup")
        .join(format!("{}_{}", date.format("%Y%m%d"), name))
}
