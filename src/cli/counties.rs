//! Define the counties subcommand
use crate::config::Config;
use crate::counties::{
    export_counties, export_single_county, group_by_county, merge_all, stats_table,
    unmapped_for_counties, write_summary_json,
};
use crate::markers::MarkerTable;
use log::info;
use std::path::PathBuf;
use structopt::StructOpt;

/// Export unmapped markers, excluding missing and private ones, per county or merged
#[derive(Debug, StructOpt)]
pub struct CountiesOpts {
    /// Marker table (CSV)
    #[structopt(short, long, parse(from_os_str), default_value = "data.csv")]
    input: PathBuf,
    /// Directory receiving one CSV per county
    #[structopt(short, long, parse(from_os_str), default_value = "UnmappedMarkersPerCounty")]
    output: PathBuf,
    /// Only export this county (case-insensitive)
    #[structopt(long)]
    county: Option<String>,
    /// Also write every exported marker into this single file
    #[structopt(long, parse(from_os_str))]
    merge: Option<PathBuf>,
    /// Write per-county counts as JSON to this file
    #[structopt(long, parse(from_os_str))]
    summary_json: Option<PathBuf>,
    /// Print per-county counts
    #[structopt(long)]
    stats: bool,
    /// Export only the core columns
    #[structopt(long)]
    simple: bool,
}

pub fn counties_command(
    config: Config,
    opts: CountiesOpts,
) -> Result<(), Box<dyn std::error::Error>> {
    let table = MarkerTable::load(&opts.input, config.columns())?;
    let markers = unmapped_for_counties(&table);
    info!("{} unmapped markers to export", markers.len());

    let summary = if let Some(county) = opts.county.as_deref() {
        match export_single_county(&table, &markers, county, &opts.output, opts.simple)? {
            Some((_, summary)) => summary,
            // nothing was exported so there is nothing to summarize either
            None => return Ok(()),
        }
    } else {
        let groups = group_by_county(&markers);
        let summary = export_counties(&table, &groups, &opts.output, opts.simple)?;
        if let Some(path) = opts.merge.as_deref() {
            merge_all(&table, &markers, path, opts.simple)?;
        }
        summary
    };

    if opts.stats {
        print!("{}", stats_table(&summary));
    }
    if let Some(path) = opts.summary_json.as_deref() {
        write_summary_json(&summary, path)?;
    }
    Ok(())
}
