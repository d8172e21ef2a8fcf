//! reelgraph CLI: compile and render timed multi-track scenes.
//!
//! Usage:
//!   reelgraph validate <SCENE>   Validate a scene file
//!   reelgraph compile <SCENE>    Print the filter graph and subtitle script
//!   reelgraph render <SCENE>     Render a scene with ffmpeg
//!   reelgraph check              Check for ffmpeg/ffprobe

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use reelgraph_common::AppConfig;

mod commands;

#[derive(Parser)]
#[command(
    name = "reelgraph",
    about = "Compile timed multi-track scenes into ffmpeg filter graphs",
    version,
    author
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a scene file
    Validate {
        /// Path to the scene JSON
        path: PathBuf,
    },

    /// Normalize a scene and print its filter graph
    Compile {
        /// Path to the scene JSON
        path: PathBuf,

        /// Write the filter graph here instead of stdout
        #[arg(long)]
        graph_out: Option<PathBuf>,

        /// Write the subtitle script here
        #[arg(long)]
        subtitles_out: Option<PathBuf>,
    },

    /// Render a scene to video
    Render {
        /// Path to the scene JSON
        path: PathBuf,

        /// Output directory
        #[arg(short, long, default_value = ".")]
        output: PathBuf,
    },

    /// Check for the external engine binaries
    Check,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::load();
    if cli.verbose {
        config.logging.level = "debug".to_string();
    }
    reelgraph_common::logging::init_logging(&config.logging);

    match cli.command {
        Commands::Validate { path } => commands::validate::run(path),
        Commands::Compile {
            path,
            graph_out,
            subtitles_out,
        } => commands::compile::run(path, graph_out, subtitles_out, &config).await,
        Commands::Render { path, output } => commands::render::run(path, output, config).await,
        Commands::Check => commands::check::run(&config),
    }
}
