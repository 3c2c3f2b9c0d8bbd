// SPDX-License-Identifier: GPL-3.0-only

use clap::{Parser, Subcommand};
use smile_camera::config::Config;
use std::fs::{self, File};
use std::path::PathBuf;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

mod cli;

#[derive(Parser)]
#[command(name = "smile-camera")]
#[command(about = "Photo booth with a countdown, filters and a weather overlay")]
#[command(version)]
#[command(subcommand_required = false)]
struct Cli {
    /// Configuration file (default: ~/.config/smile-camera/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(flatten)]
    overrides: cli::Overrides,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the photo booth in the terminal (default)
    Booth,

    /// List available cameras
    List,

    /// Print the current location, temperature and air quality
    Weather,

    /// Count down and take a single photo without the booth UI
    Photo {
        /// Output file path (default: smile-photo.png in the save directory)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let booth = matches!(cli.command, None | Some(Commands::Booth));

    // The booth owns the terminal, so its logs go to a file instead
    init_logging(booth);

    let mut config = match &cli.config {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    };
    cli.overrides.apply(&mut config);

    match cli.command {
        None | Some(Commands::Booth) => smile_camera::terminal::run(config),
        Some(Commands::List) => cli::list_cameras(),
        Some(Commands::Weather) => cli::print_weather(&config),
        Some(Commands::Photo { output }) => cli::take_photo(config, output),
    }
}

/// Set up tracing
///
/// Set the RUST_LOG environment variable to control the log level,
/// e.g. RUST_LOG=debug or RUST_LOG=smile_camera=info.
fn init_logging(to_file: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    if to_file && let Some(file) = open_log_file() {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(Mutex::new(file))
            .with_ansi(false)
            .with_target(true)
            .with_level(true)
            .init();
        return;
    }

    if to_file {
        // Writing to the terminal would corrupt the booth screen
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::sink)
            .init();
        return;
    }

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_level(true)
        .init();
}

fn open_log_file() -> Option<File> {
    let dir = dirs::cache_dir()?.join("smile-camera");
    fs::create_dir_all(&dir).ok()?;
    File::create(dir.join("smile-camera.log")).ok()
}
