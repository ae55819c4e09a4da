//! Conch CLI - an interactive shell whose commands come from WASM plugins.

mod discovery;
mod output;

use std::io::{self, IsTerminal};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use conch_core::{Channels, ConchError};
use conch_engine::Session;
use conch_plugin::PluginRuntime;
use miette::{Result, miette};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use discovery::LocationOrigin;

/// Environment variable holding the log filter.
const LOG_ENV: &str = "CONCH_LOG";

#[derive(Parser)]
#[command(name = "conch")]
#[command(
    author,
    version,
    about = "An interactive shell that discovers its commands from WASM plugins"
)]
struct Cli {
    /// Plugin directories, plugin.json manifests, or .zip archives to search
    #[arg(value_name = "LOCATION")]
    locations: Vec<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{:?}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let (locations, origin) = discovery::resolve_locations(cli.locations);
    debug!(origin = origin.label(), count = locations.len(), "resolved plugin locations");

    if origin == LocationOrigin::Nowhere {
        output::error(&format!(
            "No plugin locations given and {} is not set",
            discovery::PLUGIN_PATH_ENV
        ));
    } else if cli.verbose {
        output::locations(origin.label(), locations.iter());
    }

    let mut session = Session::new(
        PluginRuntime::new(),
        locations,
        Channels::stdio(),
        Box::new(io::stderr()),
    );

    session.run().map_err(|e| match e {
        ConchError::NoCommands { .. } => miette!(
            help = "pass plugin directories, plugin.json manifests or .zip archives as arguments",
            "{}",
            e
        ),
        other => miette!("{}", other),
    })
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "error" };
    let filter =
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default_filter));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_ansi(io::stderr().is_terminal())
        .with_target(false)
        .try_init();
}
