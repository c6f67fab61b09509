use cutout::{
    CropOffset, CutoutError, PunchConfig, ShellConfig, StageCommand, StandConfig,
};

use image::{EncodableLayout, ImageBuffer, Pixel, PixelWithColorType, RgbaImage};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Error, Debug)]
pub enum CliError {
    #[error(transparent)]
    SerdeError(#[from] serde_json::Error),
    #[error(transparent)]
    TomlDeError(#[from] toml::de::Error),
    #[error(transparent)]
    TomlSerError(#[from] toml::ser::Error),
    #[error(transparent)]
    IoError(#[from] std::io::Error),
    #[error(transparent)]
    ImageError(#[from] image::ImageError),
    #[error(transparent)]
    Cutout(#[from] CutoutError),
    #[error("Invalid crop offset '{0}', expected 'x,y'")]
    InvalidCropOffset(String),
    #[error("Unsupported file format. Please use .toml or .json files")]
    UnsupportedFileFormat,
}

/// Serde-backed configuration that can live in a `.toml` or `.json` file
pub trait ConfigFile: Serialize + DeserializeOwned {
    /// Load configuration from a TOML file
    fn from_toml_file<P: AsRef<Path>>(path: P) -> Result<Self, CliError> {
        let content = fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Load configuration from TOML string
    fn from_toml(content: &str) -> Result<Self, CliError> {
        Ok(toml::from_str(content)?)
    }

    /// Load configuration from a JSON file
    fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, CliError> {
        let content = fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Load configuration from JSON string
    fn from_json(content: &str) -> Result<Self, CliError> {
        Ok(serde_json::from_str(content)?)
    }

    /// Auto-detect file format and load configuration
    fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, CliError> {
        let path_ref = path.as_ref();
        match path_ref.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Self::from_toml_file(path),
            Some("json") => Self::from_json_file(path),
            _ => Err(CliError::UnsupportedFileFormat),
        }
    }

    /// Save configuration to a TOML file
    fn to_toml_file<P: AsRef<Path>>(&self, path: P) -> Result<(), CliError> {
        let content = self.to_toml()?;
        fs::write(path, content)?;
        Ok(())
    }

    fn to_toml(&self) -> Result<String, CliError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Save configuration to a JSON file
    fn to_json_file<P: AsRef<Path>>(&self, path: P) -> Result<(), CliError> {
        let content = self.to_json()?;
        fs::write(path, content)?;
        Ok(())
    }

    fn to_json(&self) -> Result<String, CliError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Settings for every stage, shared by the single-stage binaries.
/// Command-line flags override values read from here.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(default)]
pub struct CutoutConfig {
    pub shell: ShellConfig,
    pub punch: PunchConfig,
    pub stand: StandConfig,
}

impl ConfigFile for CutoutConfig {}

impl CutoutConfig {
    /// Load from `path` when given, otherwise use the defaults
    pub fn load(path: Option<&Path>) -> Result<Self, CliError> {
        match path {
            Some(path) => {
                debug!(path = %path.display(), "loading config");
                Self::from_file(path)
            }
            None => Ok(Self::default()),
        }
    }
}

/// A list of stages run over one input photo
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct ChainConfig {
    pub input: PathBuf,
    pub output: PathBuf,
    /// Where to write the uncropped shell alpha, if wanted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub debug_mask: Option<PathBuf>,
    pub stages: Vec<StageCommand>,
}

impl ConfigFile for ChainConfig {}

/// Parse an `x,y` crop offset from the command line
pub fn parse_crop_offset(value: &str) -> Result<CropOffset, CliError> {
    value
        .parse()
        .map_err(|_| CliError::InvalidCropOffset(value.to_string()))
}

/// Load an image as RGBA, failing with `InputNotFound` for missing paths
pub fn load_rgba(path: &Path) -> Result<RgbaImage, CliError> {
    if !path.exists() {
        return Err(CutoutError::InputNotFound(path.to_path_buf()).into());
    }
    let image = image::open(path).map_err(CutoutError::from)?;
    debug!(path = %path.display(), width = image.width(), height = image.height(), "loaded image");
    Ok(image.to_rgba8())
}

/// Save an image, creating missing parent directories. The format follows
/// the file extension.
pub fn save_image<P>(image: &ImageBuffer<P, Vec<P::Subpixel>>, path: &Path) -> Result<(), CliError>
where
    P: Pixel + PixelWithColorType,
    [P::Subpixel]: EncodableLayout,
{
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    image.save(path)?;
    debug!(path = %path.display(), "saved image");
    Ok(())
}

/// `<stem><suffix>.png` next to `path`
fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    path.with_file_name(format!("{stem}{suffix}.png"))
}

/// Default shell output for an input photo: `<stem>-shell.png`
pub fn default_shell_output(input: &Path) -> PathBuf {
    with_suffix(input, "-shell")
}

/// Debug mask path for an output image: `<stem>-mask.png`
pub fn mask_output(output: &Path) -> PathBuf {
    with_suffix(output, "-mask")
}

/// Install the tracing subscriber, `RUST_LOG` or `info` by default
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info"))
        )
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use cutout::Extent;

    #[test]
    fn test_config_toml_round_trip() {
        let mut config = CutoutConfig::default();
        config.shell.padding = 12;
        config.punch.crop_offset = CropOffset::new(30, 40);
        config.stand.rule.body_bottom = Extent::Fraction(0.8);

        let toml = config.to_toml().expect("Should serialize");
        let parsed = CutoutConfig::from_toml(&toml).expect("Should parse");
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_config_json_round_trip() {
        let config = CutoutConfig::default();
        let json = config.to_json().expect("Should serialize");
        assert_eq!(CutoutConfig::from_json(&json).expect("Should parse"), config);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config = CutoutConfig::from_toml(
            r#"
            [shell]
            crop = false

            [punch]
            expand = 20
            "#,
        )
        .expect("Should parse");
        assert!(!config.shell.crop);
        assert_eq!(config.shell.padding, 24);
        assert_eq!(config.punch.expand, 20);
        assert_eq!(config.stand, StandConfig::default());
    }

    #[test]
    fn test_chain_config_from_toml() {
        let chain = ChainConfig::from_toml(
            r#"
            input = "photos/device.jpg"
            output = "out/device.png"

            [[stages]]
            type = "extract_shell"
            params = { padding = 10 }

            [[stages]]
            type = "punch_screen"
            params = {}

            [[stages]]
            type = "remove_stand"
            [stages.params]
            min_area = 200
            "#,
        )
        .expect("Should parse");

        assert_eq!(chain.input, PathBuf::from("photos/device.jpg"));
        assert_eq!(chain.debug_mask, None);
        assert_eq!(chain.stages.len(), 3);
        match &chain.stages[0] {
            StageCommand::ExtractShell(config) => assert_eq!(config.padding, 10),
            other => panic!("unexpected stage {other}"),
        }
        assert_eq!(chain.stages[1], StageCommand::PunchScreen(PunchConfig::default()));
        match &chain.stages[2] {
            StageCommand::RemoveStand(config) => assert_eq!(config.min_area, 200),
            other => panic!("unexpected stage {other}"),
        }
    }

    #[test]
    fn test_unsupported_extension() {
        let err = CutoutConfig::from_file("config.yaml").unwrap_err();
        assert!(matches!(err, CliError::UnsupportedFileFormat));
    }

    #[test]
    fn test_parse_crop_offset() {
        assert_eq!(parse_crop_offset("24,24").expect("Should parse"), CropOffset::new(24, 24));
        assert!(matches!(
            parse_crop_offset("24;24"),
            Err(CliError::InvalidCropOffset(_))
        ));
    }

    #[test]
    fn test_output_paths() {
        let output = default_shell_output(Path::new("photos/device.jpg"));
        assert_eq!(output, PathBuf::from("photos/device-shell.png"));
        assert_eq!(mask_output(&output), PathBuf::from("photos/device-shell-mask.png"));
    }

    #[test]
    fn test_missing_input() {
        let err = load_rgba(Path::new("does/not/exist.png")).unwrap_err();
        assert!(matches!(err, CliError::Cutout(CutoutError::InputNotFound(_))));
    }
}
