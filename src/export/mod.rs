//! Write the markers found near a route to the requested output formats
//!
//! Every artifact is written to a temporary file next to its destination and renamed into
//! place once complete. Artifacts are independent, one failing is logged and recorded in
//! the [`ExportReport`] while the rest are still attempted.
use crate::markers::MarkerTable;
use crate::proximity::ProximityResult;
use crate::services::RouteMapRenderer;
use crate::Error;
use log::{debug, error, info};
use std::fmt;
use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

pub mod features;
pub mod placemarks;
pub mod table;

/// The kinds of files a route run can produce
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ArtifactKind {
    Map,
    Csv,
    SimpleCsv,
    GeoJson,
    Kml,
}

impl ArtifactKind {
    /// Output file name, encoding the status tag and radius so runs never collide
    ///
    /// `both_csv` marks a run that writes the full and the simple CSV together, the simple
    /// file then gets its own suffix.
    pub fn file_name(&self, tag: &str, radius_miles: f64, both_csv: bool) -> String {
        match self {
            ArtifactKind::Map => format!("near_route_map_{}_{}mi.html", tag, radius_miles),
            ArtifactKind::Csv => format!("near_route_{}_{}mi.csv", tag, radius_miles),
            ArtifactKind::SimpleCsv if both_csv => {
                format!("near_route_{}_{}mi_simple.csv", tag, radius_miles)
            }
            ArtifactKind::SimpleCsv => format!("near_route_{}_{}mi.csv", tag, radius_miles),
            ArtifactKind::GeoJson => {
                format!("combined_route_markers_{}_{}mi.geojson", tag, radius_miles)
            }
            ArtifactKind::Kml => format!("THC_markers_route_{}_{}mi.kml", tag, radius_miles),
        }
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ArtifactKind::Map => "map",
            ArtifactKind::Csv => "CSV",
            ArtifactKind::SimpleCsv => "simple CSV",
            ArtifactKind::GeoJson => "GeoJSON",
            ArtifactKind::Kml => "KML",
        };
        write!(f, "{}", name)
    }
}

/// Write a file so that it either appears complete or not at all
pub fn write_atomic<F>(path: &Path, write: F) -> Result<(), Error>
where
    F: FnOnce(&mut dyn Write) -> Result<(), Error>,
{
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir)?;
    {
        let mut writer = BufWriter::new(tmp.as_file_mut());
        write(&mut writer)?;
        writer.flush()?;
    }
    tmp.persist(path)?;
    Ok(())
}

/// Which artifacts to produce and where
#[derive(Clone, Debug)]
pub struct ExportOptions {
    pub output_dir: PathBuf,
    pub map: bool,
    pub csv: bool,
    pub simple: bool,
    pub geojson: bool,
    pub kml: bool,
}

impl ExportOptions {
    /// The artifacts requested, in the order they are written
    pub fn requested(&self) -> Vec<ArtifactKind> {
        let mut kinds = Vec::new();
        if self.map {
            kinds.push(ArtifactKind::Map);
        }
        if self.csv {
            kinds.push(ArtifactKind::Csv);
        }
        if self.simple {
            kinds.push(ArtifactKind::SimpleCsv);
        }
        if self.geojson {
            kinds.push(ArtifactKind::GeoJson);
        }
        if self.kml {
            kinds.push(ArtifactKind::Kml);
        }
        kinds
    }
}

impl Default for ExportOptions {
    fn default() -> Self {
        ExportOptions {
            output_dir: PathBuf::from("."),
            map: true,
            csv: false,
            simple: false,
            geojson: false,
            kml: false,
        }
    }
}

/// Outcome of an export pass
#[derive(Debug, Default)]
pub struct ExportReport {
    pub written: Vec<(ArtifactKind, PathBuf)>,
    pub failed: Vec<(ArtifactKind, String)>,
}

impl ExportReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn path(&self, kind: ArtifactKind) -> Option<&Path> {
        self.written
            .iter()
            .find(|(k, _)| *k == kind)
            .map(|(_, p)| p.as_path())
    }
}

/// Write every requested artifact for a proximity result
///
/// Only a missing output directory that cannot be created is fatal, everything else is
/// reported per artifact.
pub fn export_artifacts(
    result: &ProximityResult,
    table: &MarkerTable,
    renderer: Option<&dyn RouteMapRenderer>,
    options: &ExportOptions,
) -> Result<ExportReport, Error> {
    fs::create_dir_all(&options.output_dir)?;
    let both_csv = options.csv && options.simple;
    let mut report = ExportReport::default();

    for kind in options.requested() {
        let path = options.output_dir.join(kind.file_name(
            result.tag(),
            result.radius_miles(),
            both_csv,
        ));
        debug!("Writing {} to {:?}", kind, path);
        match write_artifact(kind, &path, result, table, renderer) {
            Ok(()) => {
                info!("Saved {} -> {:?}", kind, path);
                report.written.push((kind, path));
            }
            Err(e) => {
                error!("Failed to write {} {:?}: {}", kind, path, e);
                report.failed.push((kind, e.to_string()));
            }
        }
    }
    Ok(report)
}

fn write_artifact(
    kind: ArtifactKind,
    path: &Path,
    result: &ProximityResult,
    table: &MarkerTable,
    renderer: Option<&dyn RouteMapRenderer>,
) -> Result<(), Box<dyn std::error::Error>> {
    match kind {
        ArtifactKind::Map => {
            let renderer = renderer
                .ok_or_else(|| Error::Other("no route map renderer configured".to_string()))?;
            // render fully before touching the destination
            let page = renderer.render_map(result.route(), result.markers())?;
            write_atomic(path, |w| Ok(w.write_all(&page)?))?;
        }
        ArtifactKind::Csv => write_atomic(path, |w| {
            table::write_full_csv(w, table, result.markers().iter().copied())
        })?,
        ArtifactKind::SimpleCsv => write_atomic(path, |w| {
            table::write_simple_csv(w, table.columns(), result.markers().iter().copied())
        })?,
        ArtifactKind::GeoJson => write_atomic(path, |w| {
            let collection = features::route_feature_collection(
                result.route(),
                table,
                result.markers(),
            );
            Ok(serde_json::to_writer_pretty(w, &collection)?)
        })?,
        ArtifactKind::Kml => write_atomic(path, |w| {
            placemarks::write_placemarks(w, result.markers())
        })?,
    }
    Ok(())
}
