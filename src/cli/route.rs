//! Define the route subcommand
use crate::config::Config;
use crate::export::{export_artifacts, ExportOptions};
use crate::markers::{MarkerTable, StatusFilter};
use crate::projection::WebMercator;
use crate::proximity::{find_markers_near_route, validate_radius};
use crate::track::load_route;
use crate::Error;
use log::{info, warn};
use std::path::PathBuf;
use structopt::StructOpt;

/// Find markers within a radius of a route and write the map and requested exports
#[derive(Debug, StructOpt)]
pub struct RouteOpts {
    /// KML file holding the route
    #[structopt(short, long, parse(from_os_str))]
    track: PathBuf,
    /// Marker table (CSV)
    #[structopt(short, long, parse(from_os_str))]
    data: PathBuf,
    /// Search radius in miles
    #[structopt(short, long, default_value = "5")]
    radius: f64,
    /// Only keep markers without an HMDB entry
    #[structopt(long)]
    unmapped: bool,
    /// Only keep markers with an HMDB entry
    #[structopt(long)]
    only_mapped: bool,
    /// Export the full marker table rows to CSV
    #[structopt(long)]
    csv: bool,
    /// Export the reduced column set to CSV
    #[structopt(long)]
    simple: bool,
    /// Export route and markers as a GeoJSON feature collection
    #[structopt(long)]
    geojson: bool,
    /// Export markers as KML placemarks
    #[structopt(long)]
    kml: bool,
    /// Do not write the interactive map
    #[structopt(long)]
    no_map: bool,
    /// Directory to write output files into
    #[structopt(short, long, parse(from_os_str), default_value = ".")]
    output_dir: PathBuf,
}

pub fn route_command(config: Config, opts: RouteOpts) -> Result<(), Box<dyn std::error::Error>> {
    // argument errors are reported before any file is opened
    let filter = StatusFilter::from_flags(opts.unmapped, opts.only_mapped)?;
    let radius = validate_radius(opts.radius)?;
    let renderer = if opts.no_map {
        None
    } else {
        Some(config.get_route_visualization_handler()?)
    };

    info!("Loading route {:?}", opts.track);
    let route = load_route(&opts.track)?;
    info!("Loading dataset {:?}", opts.data);
    let table = MarkerTable::load(&opts.data, config.columns())?;

    let result = find_markers_near_route(&WebMercator, &route, &table, filter, radius)?;
    if result.is_empty() {
        warn!(
            "No {} markers within {} miles of the route",
            result.tag(),
            radius
        );
    }

    let options = ExportOptions {
        output_dir: opts.output_dir,
        map: !opts.no_map,
        csv: opts.csv,
        simple: opts.simple,
        geojson: opts.geojson,
        kml: opts.kml,
    };
    let report = export_artifacts(&result, &table, renderer.as_deref(), &options)?;
    for (kind, path) in report.written.iter() {
        println!("{}: {}", kind, path.display());
    }
    if report.is_success() {
        Ok(())
    } else {
        Err(Box::new(Error::Other(format!(
            "{} of {} requested outputs could not be written",
            report.failed.len(),
            report.failed.len() + report.written.len()
        ))))
    }
}
