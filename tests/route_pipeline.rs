use std::collections::HashSet;
use std::fs;
use std::path::Path;
use structopt::StructOpt;
use thc_markers::cli::Cli;
use thc_markers::config::{Config, ServiceConfig};
use thc_markers::export::{export_artifacts, ArtifactKind, ExportOptions};
use thc_markers::markers::Columns;
use thc_markers::nodes::{create_nodes, find_missing_osm, OsmNode};
use thc_markers::projection::WebMercator;
use thc_markers::proximity::find_markers_near_route;
use thc_markers::services::{
    new_route_visualization_handler, push_nodes, visualization::route::marker_layers,
    NodeSyncService,
};
use thc_markers::track::load_route;
use thc_markers::{Error, Marker, MarkerTable, StatusFilter};

const TRACK: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<kml xmlns="http://www.opengis.net/kml/2.2">
  <Document>
    <Placemark>
      <name>Day 1</name>
      <LineString><coordinates>-97.0,33.0,0 -97.0,33.1,0</coordinates></LineString>
    </Placemark>
    <Placemark>
      <name>Day 2</name>
      <LineString><coordinates>-95.0,30.0,0 -94.9,30.0,0</coordinates></LineString>
    </Placemark>
  </Document>
</kml>
"#;

const DATA: &str = "\
ref:US-TX:thc,ref:hmdb,OsmNodeID,name,addr:city,addr:county,thc:Latitude,thc:Longitude,website
101,5001,,Old Mill,Denton,Denton,33.05,-97.0,http://a
102, NaN ,,Court House,Denton,Denton,33.02,-97.01,
103,None,,Far Away,Austin,Travis,30.27,-97.74,
104,,,Bad Row,,Denton,,-97.0,
105,5005.0,77,Harbor & Co,Galveston,Galveston,30.01,-94.95,
106,,,Between Days,,Walker,31.5629,-96.0,
";

struct Inputs {
    dir: tempfile::TempDir,
}

impl Inputs {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("trip.kml"), TRACK).unwrap();
        fs::write(dir.path().join("data.csv"), DATA).unwrap();
        Inputs { dir }
    }

    fn path(&self, name: &str) -> std::path::PathBuf {
        self.dir.path().join(name)
    }
}

fn all_outputs(dir: &Path) -> ExportOptions {
    ExportOptions {
        output_dir: dir.to_path_buf(),
        map: true,
        csv: true,
        simple: true,
        geojson: true,
        kml: true,
    }
}

#[test]
fn route_run_writes_every_requested_artifact() {
    let inputs = Inputs::new();
    let route = load_route(&inputs.path("trip.kml")).unwrap();
    let table = MarkerTable::load(&inputs.path("data.csv"), &Columns::default()).unwrap();
    assert_eq!(table.len(), 6);
    assert_eq!(table.unlocated_rows(), 1);

    let result =
        find_markers_near_route(&WebMercator, &route, &table, StatusFilter::All, 5.0).unwrap();
    let refs: Vec<_> = result.markers().iter().filter_map(|m| m.reference()).collect();
    // 106 sits halfway along the gap between the two days
    assert_eq!(refs, vec![101, 102, 105]);

    let renderer = new_route_visualization_handler(&ServiceConfig::new("leaflet")).unwrap();
    let out = inputs.path("out");
    let report = export_artifacts(&result, &table, Some(renderer.as_ref()), &all_outputs(&out))
        .unwrap();
    assert!(report.is_success());
    assert_eq!(report.written.len(), 5);
    for name in [
        "near_route_map_all_5mi.html",
        "near_route_all_5mi.csv",
        "near_route_all_5mi_simple.csv",
        "combined_route_markers_all_5mi.geojson",
        "THC_markers_route_all_5mi.kml",
    ] {
        assert!(out.join(name).exists(), "missing {}", name);
    }

    // reloading the tabular export gives back the same markers
    let csv_path = report.path(ArtifactKind::Csv).unwrap();
    let reloaded = MarkerTable::load(csv_path, &Columns::default()).unwrap();
    let exported: HashSet<_> = reloaded.markers().iter().map(|m| m.reference()).collect();
    let expected: HashSet<_> = result.markers().iter().map(|m| m.reference()).collect();
    assert_eq!(exported, expected);
    let csv = fs::read_to_string(csv_path).unwrap();
    assert!(csv.contains("105,5005,77,Harbor & Co,"));
    assert!(!csv.contains("5005.0"));

    let geojson: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(out.join("combined_route_markers_all_5mi.geojson")).unwrap())
            .unwrap();
    let features = geojson["features"].as_array().unwrap();
    assert_eq!(features.len(), 4);
    assert_eq!(features[0]["geometry"]["type"], "MultiLineString");
    assert_eq!(features[1]["properties"]["ref:hmdb"], 5001);
    assert!(features[2]["properties"]["ref:hmdb"].is_null());

    let kml = fs::read_to_string(out.join("THC_markers_route_all_5mi.kml")).unwrap();
    assert_eq!(kml.matches("<Placemark>").count(), 3);
    assert!(kml.contains("Harbor &amp; Co"));

    let map = fs::read_to_string(report.path(ArtifactKind::Map).unwrap()).unwrap();
    assert!(map.contains("Old Mill"));
    assert!(map.contains("Court House"));
    assert!(!map.contains("Far Away"));
}

#[test]
fn map_and_filter_agree_on_mapped_status() {
    let table = MarkerTable::from_reader(DATA.as_bytes(), &Columns::default()).unwrap();
    let everything: Vec<&Marker> = table.markers().iter().collect();
    let layers = marker_layers(&everything);
    let located = |filter: StatusFilter| {
        table
            .select(filter)
            .into_iter()
            .filter(|m| m.is_located())
            .count()
    };
    assert_eq!(layers.mapped.len(), located(StatusFilter::MappedOnly));
    assert_eq!(layers.unmapped.len(), located(StatusFilter::UnmappedOnly));
    // only the row without a latitude is missing from the map
    assert_eq!(layers.mapped.len() + layers.unmapped.len(), table.len() - 1);
}

#[test]
fn unmapped_run_uses_its_own_file_names() {
    let inputs = Inputs::new();
    let route = load_route(&inputs.path("trip.kml")).unwrap();
    let table = MarkerTable::load(&inputs.path("data.csv"), &Columns::default()).unwrap();
    let result =
        find_markers_near_route(&WebMercator, &route, &table, StatusFilter::UnmappedOnly, 2.5)
            .unwrap();
    assert_eq!(result.len(), 1);
    assert_eq!(result.markers()[0].name(), Some("Court House"));

    let out = inputs.path("out");
    let options = ExportOptions {
        output_dir: out.clone(),
        map: false,
        csv: false,
        simple: true,
        geojson: false,
        kml: false,
    };
    let report = export_artifacts(&result, &table, None, &options).unwrap();
    assert!(report.is_success());
    let simple = fs::read_to_string(out.join("near_route_unmapped_2.5mi.csv")).unwrap();
    assert_eq!(simple.lines().count(), 2);
    assert!(simple.lines().nth(1).unwrap().starts_with("102,,,Court House,"));
}

#[test]
fn failed_artifact_does_not_stop_the_others() {
    let inputs = Inputs::new();
    let route = load_route(&inputs.path("trip.kml")).unwrap();
    let table = MarkerTable::load(&inputs.path("data.csv"), &Columns::default()).unwrap();
    let result =
        find_markers_near_route(&WebMercator, &route, &table, StatusFilter::All, 5.0).unwrap();

    // no renderer means the map cannot be drawn
    let out = inputs.path("out");
    let report = export_artifacts(&result, &table, None, &all_outputs(&out)).unwrap();
    assert!(!report.is_success());
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].0, ArtifactKind::Map);
    assert_eq!(report.written.len(), 4);
    assert!(!out.join("near_route_map_all_5mi.html").exists());
    assert!(out.join("THC_markers_route_all_5mi.kml").exists());
}

#[test]
fn conflicting_filters_fail_before_reading_files() {
    let cli = Cli::from_iter(&[
        "thc",
        "route",
        "--track",
        "/nonexistent/trip.kml",
        "--data",
        "/nonexistent/data.csv",
        "--unmapped",
        "--only-mapped",
    ]);
    let err = cli.execute_subcommand(Config::default()).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<Error>(),
        Some(Error::ConflictingFilterError)
    ));

    let cli = Cli::from_iter(&[
        "thc",
        "route",
        "--track",
        "/nonexistent/trip.kml",
        "--data",
        "/nonexistent/data.csv",
        "--radius",
        "0",
    ]);
    let err = cli.execute_subcommand(Config::default()).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<Error>(),
        Some(Error::InvalidRadiusError(_))
    ));
}

#[test]
fn empty_track_is_a_route_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("empty.kml");
    fs::write(&path, "<kml><Document><name>nothing</name></Document></kml>").unwrap();
    assert!(matches!(load_route(&path), Err(Error::RouteParseError(_))));
}

/// Editor stand-in that refuses one marker
struct RecordingEditor {
    refuse: i64,
}

impl NodeSyncService for RecordingEditor {
    fn add_node(&self, node: &OsmNode) -> Result<(), Box<dyn std::error::Error>> {
        if node.reference() == Some(self.refuse) {
            Err(Box::new(Error::Other("refused".to_string())))
        } else {
            Ok(())
        }
    }
}

#[test]
fn pushed_nodes_report_only_accepted_markers() {
    let table = MarkerTable::from_reader(DATA.as_bytes(), &Columns::default()).unwrap();
    let nodes = create_nodes(&table);
    assert_eq!(nodes.len(), 5);
    let synced = push_nodes(&RecordingEditor { refuse: 102 }, &nodes);
    assert_eq!(synced, vec![101, 103, 105, 106]);
}

const ATLAS: &str = "\
ref:US-TX:thc,ref:hmdb,name,addr:county,thc:Latitude,thc:Longitude,isOSM
101,5001,Old Mill,Denton,33.20,-97.10,
102,,Court House,Denton,,,
103,,Bridge,Cooke,,,False
";

const NODES: &str = r#"[
  {"lat": 33.2, "lon": -97.1, "tags": {"ref:US-TX:thc": "101"}},
  {"lat": 0.0, "lon": 0.0, "tags": {"ref:US-TX:thc": "103"}}
]"#;

#[test]
fn update_osm_rewrites_every_atlas_row() {
    let dir = tempfile::tempdir().unwrap();
    let atlas = dir.path().join("atlas.csv");
    let nodes = dir.path().join("nodes.json");
    let out = dir.path().join("updated.csv");
    fs::write(&atlas, ATLAS).unwrap();
    fs::write(&nodes, NODES).unwrap();

    let cli = Cli::from_iter(&[
        "thc",
        "update-osm",
        "--csv",
        atlas.to_str().unwrap(),
        "--nodes",
        nodes.to_str().unwrap(),
        "--out",
        out.to_str().unwrap(),
    ]);
    cli.execute_subcommand(Config::default()).unwrap();

    let written = fs::read_to_string(&out).unwrap();
    let lines: Vec<&str> = written.lines().collect();
    assert_eq!(lines.len(), 4);
    // untouched coordinate cells keep their original text
    assert_eq!(lines[1], "101,5001,Old Mill,Denton,33.20,-97.10,True,");
    assert_eq!(lines[2], "102,,Court House,Denton,,,,");
    assert_eq!(lines[3], "103,,Bridge,Cooke,,,True,");
}

#[test]
fn find_missing_includes_rows_without_coordinates() {
    let table = MarkerTable::from_reader(ATLAS.as_bytes(), &Columns::default()).unwrap();
    let extract: geojson::GeoJson = r#"{"type": "FeatureCollection", "features": [
        {"type": "Feature", "geometry": null, "properties": {"ref:US-TX:thc": 101}}
    ]}"#
    .parse()
    .unwrap();
    assert_eq!(find_missing_osm(&table, &extract), vec![102, 103]);
}
