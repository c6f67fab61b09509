use clap::Parser;
use color_eyre::eyre::Result;
use cutout::{CropOffset, CutoutManager, StageCommand};
use cutout_cli::{CutoutConfig, init_tracing, load_rgba, parse_crop_offset, save_image};
use std::path::PathBuf;
use tracing::info;

/// Punch the green screen area of the original photo out of a cutout
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Original photo with the green screen
    #[arg(long)]
    original: PathBuf,
    /// Cutout produced from the original
    #[arg(long)]
    cutout: PathBuf,
    /// Output PNG
    #[arg(short, long)]
    output: PathBuf,
    /// Position of the cutout inside the original, as x,y
    #[arg(long, value_parser = parse_crop_offset)]
    crop_offset: Option<CropOffset>,
    /// Pixels added around the detected screen (negative shrinks it)
    #[arg(long, allow_hyphen_values = true)]
    expand: Option<i64>,
    /// TOML or JSON file with stage settings
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> Result<()> {
    color_eyre::install()?;
    init_tracing();

    let cli = Cli::parse();

    let mut config = CutoutConfig::load(cli.config.as_deref())?.punch;
    if let Some(offset) = cli.crop_offset {
        config.crop_offset = offset;
    }
    if let Some(expand) = cli.expand {
        config.expand = expand;
    }

    info!("Punching screen of {} into {}", cli.original.display(), cli.cutout.display());

    let original = load_rgba(&cli.original)?;
    let cutout = load_rgba(&cli.cutout)?;
    let mut manager = CutoutManager::with_cutout(original, cutout);
    let report = manager.execute(&StageCommand::PunchScreen(config))?;

    println!("Original: {}", cli.original.display());
    println!("Cutout: {}", cli.cutout.display());
    println!("Output: {}", cli.output.display());
    println!("{report}");

    save_image(&manager.into_current(), &cli.output)?;
    Ok(())
}
