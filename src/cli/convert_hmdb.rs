//! Define the convert-hmdb subcommand
use crate::hmdb::convert_hmdb_csv;
use std::path::PathBuf;
use structopt::StructOpt;

/// Convert an HMDB search export into the atlas column layout
#[derive(Debug, StructOpt)]
pub struct ConvertHmdbOpts {
    /// HMDB CSV export
    #[structopt(short, long, parse(from_os_str))]
    input: PathBuf,
    /// Converted CSV to write
    #[structopt(short, long, parse(from_os_str))]
    output: PathBuf,
}

pub fn convert_hmdb_command(opts: ConvertHmdbOpts) -> Result<(), Box<dyn std::error::Error>> {
    let rows = convert_hmdb_csv(&opts.input, &opts.output)?;
    println!("Converted {} rows -> {}", rows, opts.output.display());
    Ok(())
}
