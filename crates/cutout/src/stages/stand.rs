//! Stand removal: trim the appendage below the device body from a cutout.
//!
//! The keep-rule is a handful of cut lines. Each line is an [`Extent`], either
//! an absolute pixel position or a fraction of the cutout's width (vertical
//! lines) or height (horizontal lines). The defaults are the pixel positions
//! tuned on the reference photo.

use image::RgbaImage;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::{
    algorithms::LargeComponents,
    error::Result,
    pipeline::builder::AlphaPipelineBuilder,
    stages::shell::apply_alpha,
    traits::ComponentSelector,
    types::{BoundingBox, Mask},
};

/// A position along one image axis
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Extent {
    Pixels(u32),
    /// Fraction of the axis length
    Fraction(f64),
}

impl Extent {
    /// Pixel position on an axis of `span` pixels
    pub fn resolve(self, span: u32) -> u32 {
        match self {
            Extent::Pixels(p) => p,
            Extent::Fraction(f) => (f * span as f64).round().max(0.0) as u32,
        }
    }

    /// The same position as a fraction of `span`
    pub fn relative_to(self, span: u32) -> Self {
        match self {
            Extent::Pixels(p) if span > 0 => Extent::Fraction(p as f64 / span as f64),
            other => other,
        }
    }
}

/// Cut lines of the keep-rule. A pixel with non-zero alpha survives when any
/// of the following holds:
///
/// - it lies above `body_bottom`
/// - it lies left of `left_wrist_right` and above `wrist_bottom`
/// - it lies right of `right_wrist_left` and above `wrist_bottom`
/// - it lies between `belly_left` and `belly_right` and above `belly_bottom`
///
/// All bounds are inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct StandRule {
    pub body_bottom: Extent,
    pub wrist_bottom: Extent,
    pub left_wrist_right: Extent,
    pub right_wrist_left: Extent,
    pub belly_left: Extent,
    pub belly_right: Extent,
    pub belly_bottom: Extent,
}

impl Default for StandRule {
    fn default() -> Self {
        Self {
            body_bottom: Extent::Pixels(642),
            wrist_bottom: Extent::Pixels(730),
            left_wrist_right: Extent::Pixels(210),
            right_wrist_left: Extent::Pixels(720),
            belly_left: Extent::Pixels(170),
            belly_right: Extent::Pixels(280),
            belly_bottom: Extent::Pixels(675),
        }
    }
}

/// A [`StandRule`] resolved to pixel positions for one image size
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedStandRule {
    body_bottom: u32,
    wrist_bottom: u32,
    left_wrist_right: u32,
    right_wrist_left: u32,
    belly_left: u32,
    belly_right: u32,
    belly_bottom: u32,
}

impl ResolvedStandRule {
    #[inline]
    pub fn keeps(&self, x: u32, y: u32) -> bool {
        y <= self.body_bottom
            || (x <= self.left_wrist_right && y <= self.wrist_bottom)
            || (x >= self.right_wrist_left && y <= self.wrist_bottom)
            || ((self.belly_left..=self.belly_right).contains(&x) && y <= self.belly_bottom)
    }
}

impl StandRule {
    pub fn resolve(&self, width: u32, height: u32) -> ResolvedStandRule {
        ResolvedStandRule {
            body_bottom: self.body_bottom.resolve(height),
            wrist_bottom: self.wrist_bottom.resolve(height),
            left_wrist_right: self.left_wrist_right.resolve(width),
            right_wrist_left: self.right_wrist_left.resolve(width),
            belly_left: self.belly_left.resolve(width),
            belly_right: self.belly_right.resolve(width),
            belly_bottom: self.belly_bottom.resolve(height),
        }
    }

    /// Express every pixel cut line as a fraction of a `width` x `height`
    /// reference, so the rule scales to other resolutions.
    pub fn relative_to(&self, width: u32, height: u32) -> Self {
        Self {
            body_bottom: self.body_bottom.relative_to(height),
            wrist_bottom: self.wrist_bottom.relative_to(height),
            left_wrist_right: self.left_wrist_right.relative_to(width),
            right_wrist_left: self.right_wrist_left.relative_to(width),
            belly_left: self.belly_left.relative_to(width),
            belly_right: self.belly_right.relative_to(width),
            belly_bottom: self.belly_bottom.relative_to(height),
        }
    }

    /// Mask of the opaque pixels of `cutout` that the rule keeps
    pub fn keep_mask(&self, cutout: &RgbaImage) -> Mask {
        let rule = self.resolve(cutout.width(), cutout.height());
        Mask::from_fn(cutout.width(), cutout.height(), |x, y| {
            cutout.get_pixel(x, y)[3] > 0 && rule.keeps(x, y)
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct StandConfig {
    pub rule: StandRule,
    /// Components smaller than this are dropped after trimming
    pub min_area: usize,
    pub blur_sigma: f32,
    pub alpha_threshold: u8,
}

impl Default for StandConfig {
    fn default() -> Self {
        Self {
            rule: StandRule::default(),
            min_area: 400,
            blur_sigma: 0.8,
            alpha_threshold: 90,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TrimmedCutout {
    pub image: RgbaImage,
    pub bounding_box: Option<BoundingBox>,
}

#[derive(Debug, Clone, Default)]
pub struct StandRemover {
    pub config: StandConfig,
}

impl StandRemover {
    pub fn new(config: StandConfig) -> Self {
        Self { config }
    }

    pub fn remove(&self, cutout: &RgbaImage) -> Result<TrimmedCutout> {
        let config = &self.config;

        let keep = config.rule.keep_mask(cutout);
        let keep = LargeComponents { min_area: config.min_area }.select(&keep);
        if keep.count() == 0 {
            warn!("stand removal kept nothing; output will be fully transparent");
        }

        let alpha = AlphaPipelineBuilder::build_smoothing(config.blur_sigma, config.alpha_threshold)
            .refine(&keep)?;

        let mut image = cutout.clone();
        apply_alpha(&mut image, &alpha)?;
        let bounding_box = BoundingBox::of_alpha(&alpha);

        info!(bbox = ?bounding_box, "removed stand");
        Ok(TrimmedCutout { image, bounding_box })
    }
}
