use clap::Parser;
use color_eyre::eyre::Result;
use cutout::{CutoutManager, StageCommand};
use cutout_cli::{ChainConfig, ConfigFile, init_tracing, load_rgba, save_image};
use std::path::PathBuf;
use strum::IntoEnumIterator;
use tracing::{info, warn};

/// Run a configured list of cutout stages over one photo
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// TOML or JSON chain configuration
    #[arg(short, long, required_unless_present_any = ["list_stages", "print_schema"])]
    config: Option<PathBuf>,
    /// List the available stages and exit
    #[arg(long)]
    list_stages: bool,
    /// Print the JSON schema of the chain configuration and exit
    #[arg(long)]
    print_schema: bool,
}

fn main() -> Result<()> {
    color_eyre::install()?;
    init_tracing();

    let cli = Cli::parse();

    if cli.list_stages {
        for command in StageCommand::iter() {
            println!("{}: {}", command, command.description());
        }
        return Ok(());
    }
    if cli.print_schema {
        let schema = schemars::schema_for!(ChainConfig);
        println!("{}", serde_json::to_string_pretty(&schema)?);
        return Ok(());
    }

    let Some(config_path) = cli.config else {
        return Ok(());
    };
    let chain = ChainConfig::from_file(&config_path)?;
    info!("Loaded chain with {} stage(s) from {}", chain.stages.len(), config_path.display());
    if chain.stages.is_empty() {
        warn!("Chain has no stages; the input is copied unchanged");
    }

    let mut manager = CutoutManager::new(load_rgba(&chain.input)?);
    println!("Input: {}", chain.input.display());

    for (index, command) in chain.stages.iter().enumerate() {
        let report = manager.execute(command)?;
        println!("[{}] {}", index + 1, command);
        println!("{report}");
    }

    if let Some(mask_path) = &chain.debug_mask {
        match manager.shell_alpha() {
            Some(alpha) => {
                save_image(alpha, mask_path)?;
                println!("Mask: {}", mask_path.display());
            }
            None => warn!("debug_mask set but the chain has no extract_shell stage"),
        }
    }

    save_image(&manager.into_current(), &chain.output)?;
    println!("Output: {}", chain.output.display());
    Ok(())
}
