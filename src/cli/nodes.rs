//! Define the OpenStreetMap node subcommands
use super::parse_date;
use crate::config::Config;
use crate::export::{table::write_full_csv, write_atomic};
use crate::markers::MarkerTable;
use crate::nodes::{
    create_nodes, dated_backup_path, find_missing_osm, load_geojson, load_nodes, save_nodes,
    update_osm_flags,
};
use crate::services::push_nodes;
use chrono::{Local, NaiveDate};
use log::info;
use std::collections::HashSet;
use std::fs::create_dir_all;
use std::path::PathBuf;
use structopt::StructOpt;

/// Convert atlas markers into nodes ready for the map editor
#[derive(Debug, StructOpt)]
pub struct CreateNodesOpts {
    /// Marker table (CSV)
    #[structopt(long, parse(from_os_str))]
    csv: PathBuf,
    /// Nodes file to write
    #[structopt(long, parse(from_os_str), default_value = "nodes.json")]
    out: PathBuf,
}

pub fn create_nodes_command(
    config: Config,
    opts: CreateNodesOpts,
) -> Result<(), Box<dyn std::error::Error>> {
    let table = MarkerTable::load(&opts.csv, config.columns())?;
    let nodes = create_nodes(&table);
    save_nodes(&opts.out, &nodes)?;
    println!("Generated {} nodes -> {}", nodes.len(), opts.out.display());
    Ok(())
}

/// Push nodes into the configured map editor one at a time
#[derive(Debug, StructOpt)]
pub struct PushNodesOpts {
    /// Nodes file written by create-nodes
    #[structopt(long, parse(from_os_str))]
    nodes: PathBuf,
}

pub fn push_nodes_command(
    config: Config,
    opts: PushNodesOpts,
) -> Result<(), Box<dyn std::error::Error>> {
    let service = config.get_node_sync_handler()?;
    let nodes = load_nodes(&opts.nodes)?;
    let synced = push_nodes(service.as_ref(), &nodes);
    println!("Pushed {} of {} nodes: {:?}", synced.len(), nodes.len(), synced);
    Ok(())
}

/// List THC reference numbers that are absent from an OSM GeoJSON extract
#[derive(Debug, StructOpt)]
pub struct FindMissingOpts {
    /// Marker table (CSV)
    #[structopt(long, parse(from_os_str))]
    csv: PathBuf,
    /// GeoJSON extract of OSM marker nodes
    #[structopt(long, parse(from_os_str))]
    geo: PathBuf,
}

pub fn find_missing_command(
    config: Config,
    opts: FindMissingOpts,
) -> Result<(), Box<dyn std::error::Error>> {
    let table = MarkerTable::load(&opts.csv, config.columns())?;
    let extract = load_geojson(&opts.geo)?;
    let missing = find_missing_osm(&table, &extract);
    println!("{:?}", missing);
    Ok(())
}

/// Set the isOSM flag of every marker listed in a nodes file
#[derive(Debug, StructOpt)]
pub struct UpdateOsmOpts {
    /// Marker table (CSV)
    #[structopt(long, parse(from_os_str))]
    csv: PathBuf,
    /// Nodes file whose markers are now in OSM
    #[structopt(long, parse(from_os_str))]
    nodes: PathBuf,
    /// Updated marker table to write
    #[structopt(long, parse(from_os_str))]
    out: PathBuf,
    /// Write into file_backup/ with the date prefixed to the file name
    #[structopt(long)]
    dated: bool,
    /// Date used by --dated instead of today (YYYY-MM-DD format)
    #[structopt(long, parse(try_from_str = parse_date))]
    date: Option<NaiveDate>,
}

pub fn update_osm_command(
    config: Config,
    opts: UpdateOsmOpts,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut table = MarkerTable::load(&opts.csv, config.columns())?;
    let references: HashSet<i64> = load_nodes(&opts.nodes)?
        .iter()
        .filter_map(|n| n.reference())
        .collect();
    let changed = update_osm_flags(&mut table, &references);

    let out = if opts.dated {
        let date = opts
            .date
            .unwrap_or_else(|| Local::now().naive_local().date());
        dated_backup_path(&opts.out, date)
    } else {
        opts.out
    };
    if let Some(dir) = out.parent().filter(|d| !d.as_os_str().is_empty()) {
        create_dir_all(dir)?;
    }
    write_atomic(&out, |w| write_full_csv(w, &table, table.markers()))?;
    info!("Saved {:?}", out);
    println!("Updated {} markers as OSM-present -> {}", changed, out.display());
    Ok(())
}
