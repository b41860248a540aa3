//! StyleSync CLI - virtual wardrobe and outfit try-on from the command line

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{generate, init, item, key, outfit};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "stylesync")]
#[command(about = "Virtual wardrobe: register photos and render every outfit combination", long_about = None)]
#[command(version)]
struct Cli {
    /// Show debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the .stylesync library in the current directory
    Init {
        /// Seed the wardrobe with the demo profile and garments
        #[arg(long)]
        demo: bool,
    },

    /// Wardrobe item operations
    #[command(subcommand)]
    Item(item::ItemCommands),

    /// Render outfits
    #[command(subcommand)]
    Generate(generate::GenerateCommands),

    /// Outfit record operations
    #[command(subcommand)]
    Outfit(outfit::OutfitCommands),

    /// Manage the image API key
    #[command(subcommand)]
    Key(key::KeyCommands),

    /// Remove every item and outfit from the library
    Reset {
        /// Skip the confirmation check
        #[arg(long)]
        yes: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Init { demo } => init::run(demo),
        Commands::Item(cmd) => item::run(cmd),
        Commands::Generate(cmd) => generate::run(cmd),
        Commands::Outfit(cmd) => outfit::run(cmd),
        Commands::Key(cmd) => key::run(cmd),
        Commands::Reset { yes } => init::run_reset(yes),
    }
}
