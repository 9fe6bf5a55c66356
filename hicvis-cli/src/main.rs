use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;
mod config;
mod error;

use commands::inspect::InspectArgs;
use commands::render::RenderArgs;
use commands::url::UrlArgs;
use config::Config;
use error::{format_error_with_suggestions, CliError};

#[derive(Parser)]
#[command(name = "hicvis")]
#[command(about = "HiCVis - Voronoi contact map viewer")]
#[command(version)]
#[command(long_about = "
HiCVis renders Hi-C contact maps from the binary payloads served by the
HiCVis backend: a density image of raw bin counts and a Voronoi layer whose
cells are coloured by log area.

Examples:
  hicvis render --payload view.bin --catalog details.json --x chr2L:0-1,000,000 --y chr2L:0-1,000,000 --out view.svg
  hicvis render --payload tri.bin --catalog details.json --x chr2L:0-500000 --triangle --layer density --out tri.png
  hicvis inspect --payload view.bin --json
  hicvis url 'srcChrom=chr2L&srcStart=0&srcEnd=1000&tarChrom=chr2L&tarStart=0&tarEnd=1000'
")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file path
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (suppress non-error output)
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Export one view of a payload to SVG/PNG
    Render(RenderArgs),

    /// Summarise the contents of a payload
    Inspect(InspectArgs),

    /// Decode or build a view URL query
    Url(UrlArgs),

    /// Print a sample hicvis.toml with every default filled in
    Config,
}

fn setup_logging(verbose: u8, quiet: bool) {
    let level = if quiet {
        "error"
    } else {
        match verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

fn run(cli: Cli) -> Result<()> {
    let config = Config::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Render(args) => commands::render::execute(&config, args),
        Commands::Inspect(args) => commands::inspect::execute(&config, args),
        Commands::Url(args) => commands::url::execute(args),
        Commands::Config => {
            print!("{}", Config::example_toml()?);
            Ok(())
        }
    }
}

fn main() {
    let cli = Cli::parse();
    setup_logging(cli.verbose, cli.quiet);

    if let Err(err) = run(cli) {
        match err.downcast_ref::<CliError>() {
            Some(cli_err) => eprintln!("Error: {}", format_error_with_suggestions(cli_err)),
            None => eprintln!("Error: {:#}", err),
        }
        std::process::exit(1);
    }
}
