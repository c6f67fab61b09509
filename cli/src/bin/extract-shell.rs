use clap::Parser;
use color_eyre::eyre::Result;
use cutout::{CutoutManager, StageCommand};
use cutout_cli::{CutoutConfig, default_shell_output, init_tracing, load_rgba, mask_output, save_image};
use std::path::PathBuf;
use tracing::info;

/// Cut a device out of a photo taken on a uniform background
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the input photo
    input: PathBuf,
    /// Output PNG (defaults to <stem>-shell.png next to the input)
    #[arg(short, long)]
    output: Option<PathBuf>,
    /// Keep the full canvas instead of cropping to the device
    #[arg(long)]
    no_crop: bool,
    /// Margin around the device when cropping
    #[arg(long)]
    padding: Option<u32>,
    /// Also write the uncropped alpha as <out-stem>-mask.png
    #[arg(long)]
    debug_mask: bool,
    /// TOML or JSON file with stage settings
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> Result<()> {
    color_eyre::install()?;
    init_tracing();

    let cli = Cli::parse();

    let mut config = CutoutConfig::load(cli.config.as_deref())?.shell;
    if cli.no_crop {
        config.crop = false;
    }
    if let Some(padding) = cli.padding {
        config.padding = padding;
    }

    let output = cli.output.unwrap_or_else(|| default_shell_output(&cli.input));
    info!("Extracting shell from {}", cli.input.display());

    let mut manager = CutoutManager::new(load_rgba(&cli.input)?);
    let report = manager.execute(&StageCommand::ExtractShell(config))?;

    println!("Input: {}", cli.input.display());
    println!("Output: {}", output.display());
    println!("{report}");

    if let (true, Some(alpha)) = (cli.debug_mask, manager.shell_alpha()) {
        let mask_path = mask_output(&output);
        save_image(alpha, &mask_path)?;
        println!("Mask: {}", mask_path.display());
    }

    save_image(&manager.into_current(), &output)?;
    Ok(())
}
