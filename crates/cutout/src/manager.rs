use std::fmt;

use image::{GrayImage, RgbaImage};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, IntoStaticStr, VariantNames};
use tracing::info;

use crate::{
    algorithms::PunchRect,
    error::Result,
    stages::{
        PunchConfig, ScreenPuncher, ShellConfig, ShellExtractor, StandConfig, StandRemover,
    },
    types::{BoundingBox, Color, CropOffset},
};

#[derive(
    Debug, Clone,
    Serialize, Deserialize, JsonSchema,
    Display, EnumIter, VariantNames, IntoStaticStr,
    PartialEq
)]
#[serde(tag = "type", content = "params")]
#[strum(serialize_all = "snake_case")]
pub enum StageCommand {
    /// Segment the device from the original photo
    #[serde(rename = "extract_shell")]
    ExtractShell(ShellConfig),

    /// Make the detected screen area of the current cutout transparent
    #[serde(rename = "punch_screen")]
    PunchScreen(PunchConfig),

    /// Trim the stand from the current cutout
    #[serde(rename = "remove_stand")]
    RemoveStand(StandConfig),
}

impl StageCommand {
    /// Get the JSON schema for all commands
    pub fn schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(StageCommand)
    }

    /// Get a list of all available command names
    pub fn command_names() -> &'static [&'static str] {
        <Self as VariantNames>::VARIANTS
    }

    /// Get a description of the command
    pub fn description(&self) -> &'static str {
        match self {
            Self::ExtractShell(_) => "Extract the device from a photo with a uniform background",
            Self::PunchScreen(_) => "Punch the green screen area out of the current cutout",
            Self::RemoveStand(_) => "Remove the stand below the device body from the current cutout",
        }
    }
}

/// What a stage did, for reporting
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "stage", rename_all = "snake_case")]
pub enum StageReport {
    Shell {
        background: Color,
        tolerance: u32,
        kept_pixels: usize,
        bounding_box: Option<BoundingBox>,
        crop_offset: CropOffset,
        width: u32,
        height: u32,
    },
    Punch {
        screen: BoundingBox,
        crop_offset: CropOffset,
        rect: PunchRect,
        radius: u32,
    },
    Stand {
        bounding_box: Option<BoundingBox>,
    },
}

fn fmt_bbox(bbox: &Option<BoundingBox>) -> String {
    bbox.map(|b| b.to_string()).unwrap_or_else(|| "None".to_string())
}

impl fmt::Display for StageReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StageReport::Shell {
                background,
                tolerance,
                kept_pixels,
                bounding_box,
                crop_offset,
                width,
                height,
            } => {
                writeln!(f, "Size: {width}x{height}")?;
                writeln!(f, "Estimated background color: {background}")?;
                writeln!(f, "Tolerance: {tolerance}")?;
                writeln!(f, "Kept pixels: {kept_pixels}")?;
                writeln!(f, "Alpha bbox: {}", fmt_bbox(bounding_box))?;
                write!(f, "Crop offset: {crop_offset}")
            }
            StageReport::Punch { screen, crop_offset, rect, radius } => {
                writeln!(f, "Detected green bbox in original: {screen}")?;
                writeln!(f, "Crop offset: {crop_offset}")?;
                write!(f, "Punch rect: {rect} (radius {radius})")
            }
            StageReport::Stand { bounding_box } => {
                write!(f, "Mask bbox: {}", fmt_bbox(bounding_box))
            }
        }
    }
}

/// Runs stages in sequence over one photo. Each stage reads the current
/// cutout and replaces it with its own output.
#[derive(Clone)]
pub struct CutoutManager {
    original: RgbaImage,
    current: Option<RgbaImage>,
    shell_alpha: Option<GrayImage>,
    shell_offset: Option<CropOffset>,
}

impl CutoutManager {
    pub fn new(original: RgbaImage) -> Self {
        Self {
            original,
            current: None,
            shell_alpha: None,
            shell_offset: None,
        }
    }

    /// Start from an existing cutout of `original`, e.g. one saved by an
    /// earlier run. Punching then uses the configured crop offset.
    pub fn with_cutout(original: RgbaImage, cutout: RgbaImage) -> Self {
        Self {
            current: Some(cutout),
            ..Self::new(original)
        }
    }

    pub fn original(&self) -> &RgbaImage {
        &self.original
    }

    /// The latest cutout, or the original when no stage has run yet
    pub fn current(&self) -> &RgbaImage {
        self.current.as_ref().unwrap_or(&self.original)
    }

    pub fn into_current(self) -> RgbaImage {
        self.current.unwrap_or(self.original)
    }

    /// Uncropped alpha of the last shell extraction
    pub fn shell_alpha(&self) -> Option<&GrayImage> {
        self.shell_alpha.as_ref()
    }

    pub fn execute(&mut self, command: &StageCommand) -> Result<StageReport> {
        info!(command = %command, "running stage");

        let (image, report) = match command {
            StageCommand::ExtractShell(config) => {
                let shell = ShellExtractor::new(config.clone()).extract(&self.original)?;
                self.shell_offset = Some(shell.crop_offset);
                let report = StageReport::Shell {
                    background: shell.background,
                    tolerance: shell.tolerance,
                    kept_pixels: shell.kept_pixels,
                    bounding_box: shell.bounding_box,
                    crop_offset: shell.crop_offset,
                    width: self.original.width(),
                    height: self.original.height(),
                };
                self.shell_alpha = Some(shell.alpha);
                (shell.image, report)
            }
            StageCommand::PunchScreen(config) => {
                let mut config = config.clone();
                if let Some(offset) = self.shell_offset {
                    config.crop_offset = offset;
                }
                let crop_offset = config.crop_offset;
                let punched = ScreenPuncher::new(config).punch(&self.original, self.current())?;
                let report = StageReport::Punch {
                    screen: punched.screen,
                    crop_offset,
                    rect: punched.rect,
                    radius: punched.radius,
                };
                (punched.image, report)
            }
            StageCommand::RemoveStand(config) => {
                let trimmed = StandRemover::new(config.clone()).remove(self.current())?;
                let report = StageReport::Stand {
                    bounding_box: trimmed.bounding_box,
                };
                (trimmed.image, report)
            }
        };

        self.current = Some(image);
        Ok(report)
    }

    /// Execute every command in order, stopping at the first failure
    pub fn run(&mut self, commands: &[StageCommand]) -> Result<Vec<StageReport>> {
        commands.iter().map(|command| self.execute(command)).collect()
    }
}
