//! TileMosaic CLI - Command-line interface
//!
//! This binary provides a command-line interface to the TileMosaic library.

mod commands;
mod error;

use clap::{Parser, Subcommand};

use commands::render::RenderArgs;

#[derive(Parser)]
#[command(name = "tilemosaic")]
#[command(version, about = "Render map regions from tiled map sources", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a bounding box into a PNG image
    Render(RenderArgs),
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Render(args) => commands::render::run(args),
    };

    if let Err(e) = result {
        e.exit();
    }
}
