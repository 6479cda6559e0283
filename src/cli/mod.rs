//! Define the application's command line interface
use crate::config::Config;
use chrono::NaiveDate;
use simplelog::LevelFilter;
use std::path::{Path, PathBuf};
use structopt::StructOpt;

mod convert_hmdb;
use convert_hmdb::{convert_hmdb_command, ConvertHmdbOpts};
mod counties;
use counties::{counties_command, CountiesOpts};
mod nodes;
use nodes::{
    create_nodes_command, find_missing_command, push_nodes_command, update_osm_command,
    CreateNodesOpts, FindMissingOpts, PushNodesOpts, UpdateOsmOpts,
};
mod route;
use route::{route_command, RouteOpts};
mod view_csv;
use view_csv::{view_csv_command, ViewCsvOpts};

/// Find historical markers along a route and manage the THC marker atlas
#[derive(Debug, StructOpt)]
#[structopt(name = "thc")]
pub struct Cli {
    /// Set logging level to debug, use a second time (e.g. -vv) to set logging to trace
    #[structopt(short, long, parse(from_occurrences))]
    verbose: i32,
    /// Suppress info logging messages use a second time (e.g. -qq) to hide warnings
    #[structopt(short, long, parse(from_occurrences))]
    quiet: i32,
    /// Configuration file to use instead of the one in the user's config directory
    #[structopt(short, long, parse(from_os_str))]
    config: Option<PathBuf>,
    #[structopt(subcommand)]
    cmd: Command,
}

impl Cli {
    /// Return the verbose flag counts as a log level filter
    pub fn verbosity(&self, default: LevelFilter) -> LevelFilter {
        if self.quiet == 1 {
            LevelFilter::Warn
        } else if self.quiet > 1 {
            LevelFilter::Error
        } else if self.verbose == 1 {
            LevelFilter::Debug
        } else if self.verbose > 1 {
            LevelFilter::Trace
        } else {
            default
        }
    }

    pub fn config_path(&self) -> Option<&Path> {
        self.config.as_deref()
    }

    /// Consume options struct and return the result of subcommand execution
    pub fn execute_subcommand(self, config: Config) -> Result<(), Box<dyn std::error::Error>> {
        self.cmd.execute(config)
    }
}

#[derive(Debug, StructOpt)]
pub enum Command {
    /// Find markers within a radius of a KML route and export them
    #[structopt(name = "route")]
    Route(RouteOpts),
    /// Export unmapped markers into one CSV per county
    #[structopt(name = "counties")]
    Counties(CountiesOpts),
    /// Print a CSV file as an aligned table
    #[structopt(name = "view-csv")]
    ViewCsv(ViewCsvOpts),
    /// Convert an HMDB search export into the atlas column layout
    #[structopt(name = "convert-hmdb")]
    ConvertHmdb(ConvertHmdbOpts),
    /// Build OpenStreetMap nodes from the atlas
    #[structopt(name = "create-nodes")]
    CreateNodes(CreateNodesOpts),
    /// Send nodes to the map editor
    #[structopt(name = "push-nodes")]
    PushNodes(PushNodesOpts),
    /// List atlas markers that are absent from an OSM extract
    #[structopt(name = "find-missing")]
    FindMissing(FindMissingOpts),
    /// Flag markers present in a nodes file as mapped in OSM
    #[structopt(name = "update-osm")]
    UpdateOsm(UpdateOsmOpts),
}

impl Command {
    /// Consume enum variant and return the result of the command's execution
    fn execute(self, config: Config) -> Result<(), Box<dyn std::error::Error>> {
        match self {
            Command::Route(opts) => route_command(config, opts),
            Command::Counties(opts) => counties_command(config, opts),
            Command::ViewCsv(opts) => view_csv_command(opts),
            Command::ConvertHmdb(opts) => convert_hmdb_command(opts),
            Command::CreateNodes(opts) => create_nodes_command(config, opts),
            Command::PushNodes(opts) => push_nodes_command(config, opts),
            Command::FindMissing(opts) => find_missing_command(config, opts),
            Command::UpdateOsm(opts) => update_osm_command(config, opts),
        }
    }
}

fn parse_date(src: &str) -> Result<NaiveDate, chrono::format::ParseError> {
    NaiveDate::parse_from_str(src, "%Y-%m-%d")
}
