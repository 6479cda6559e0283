use log::debug;
use simplelog::{ColorChoice, Config as LogConfig, TermLogger, TerminalMode};
use structopt::StructOpt;
use thc_markers::cli::Cli;
use thc_markers::config::Config;
use thc_markers::{default_config_path, Error};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let opt = Cli::from_args();
    if let Some(path) = opt.config_path() {
        if !path.exists() {
            return Err(Box::new(Error::Other(format!(
                "Configuration file {:?} does not exist",
                path
            ))));
        }
    }
    let config_path = opt
        .config_path()
        .map(|p| p.to_path_buf())
        .unwrap_or_else(default_config_path);
    let config = Config::from_path(&config_path)?;

    let level_filter = opt.verbosity(config.log_level());
    TermLogger::init(
        level_filter,
        LogConfig::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )?;
    debug!("Using configuration {:?}", config_path);

    // execute any subcommands
    opt.execute_subcommand(config)
}
