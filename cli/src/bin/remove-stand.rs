use clap::Parser;
use color_eyre::eyre::Result;
use cutout::{CutoutManager, StageCommand};
use cutout_cli::{CutoutConfig, init_tracing, load_rgba, save_image};
use std::path::PathBuf;
use tracing::info;

/// Trim the stand below the device body from a cutout
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Cutout PNG with alpha
    #[arg(short, long)]
    input: PathBuf,
    /// Output PNG
    #[arg(short, long)]
    output: PathBuf,
    /// Drop fragments smaller than this many pixels
    #[arg(long)]
    min_area: Option<usize>,
    /// TOML or JSON file with stage settings
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> Result<()> {
    color_eyre::install()?;
    init_tracing();

    let cli = Cli::parse();

    let mut config = CutoutConfig::load(cli.config.as_deref())?.stand;
    if let Some(min_area) = cli.min_area {
        config.min_area = min_area;
    }

    info!("Removing stand from {}", cli.input.display());

    let mut manager = CutoutManager::new(load_rgba(&cli.input)?);
    let report = manager.execute(&StageCommand::RemoveStand(config))?;

    println!("Input: {}", cli.input.display());
    println!("Output: {}", cli.output.display());
    println!("{report}");

    save_image(&manager.into_current(), &cli.output)?;
    Ok(())
}
