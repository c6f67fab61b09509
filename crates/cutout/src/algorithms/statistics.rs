use std::collections::HashMap;

use image::RgbImage;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    algorithms::border_indices,
    error::{CutoutError, Result},
    types::Color,
};

/// Colors of the border pixels in [`border_indices`] order
pub fn border_pixels(image: &RgbImage) -> Vec<Color> {
    let width = image.width() as usize;
    border_indices(image.width(), image.height())
        .into_iter()
        .map(|idx| Color::from(image.get_pixel((idx % width) as u32, (idx / width) as u32)))
        .collect()
}

/// Background color and flood tolerance estimated from the border
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct BackgroundEstimate {
    pub color: Color,
    pub tolerance: u32,
}

/// Estimates the background color and a color-distance tolerance from the
/// image border.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct BackgroundEstimator {
    /// Channel bucket width used when voting for the dominant border color
    pub quantize_step: u8,
    /// Border-distance percentile used as the noise level (0.0-1.0)
    pub percentile: f64,
    /// Added to the percentile distance
    pub tolerance_margin: f64,
    pub min_tolerance: u32,
    pub max_tolerance: u32,
    /// Used when there are no border pixels to measure
    pub fallback_tolerance: u32,
}

impl Default for BackgroundEstimator {
    fn default() -> Self {
        Self {
            quantize_step: 8,
            percentile: 0.9,
            tolerance_margin: 8.0,
            min_tolerance: 16,
            max_tolerance: 62,
            fallback_tolerance: 28,
        }
    }
}

impl BackgroundEstimator {
    pub fn validate(&self) -> Result<()> {
        if self.quantize_step == 0 {
            return Err(CutoutError::InvalidConfig("quantize_step must be at least 1".into()));
        }
        if !(0.0..=1.0).contains(&self.percentile) {
            return Err(CutoutError::InvalidConfig(format!(
                "percentile must lie in [0, 1], got {}",
                self.percentile
            )));
        }
        if self.min_tolerance > self.max_tolerance {
            return Err(CutoutError::InvalidConfig(format!(
                "min_tolerance {} exceeds max_tolerance {}",
                self.min_tolerance, self.max_tolerance
            )));
        }
        Ok(())
    }

    /// Mean color of the border pixels that fall into the most frequent
    /// quantized bucket. Equal counts go to the bucket seen first.
    pub fn estimate_background_color(&self, image: &RgbImage) -> Option<Color> {
        let border = border_pixels(image);

        let mut buckets: Vec<(Color, usize)> = Vec::new();
        let mut slots: HashMap<Color, usize> = HashMap::new();
        for px in &border {
            let bucket = px.quantize(self.quantize_step);
            match slots.get(&bucket) {
                Some(&slot) => buckets[slot].1 += 1,
                None => {
                    slots.insert(bucket, buckets.len());
                    buckets.push((bucket, 1));
                }
            }
        }

        let mut dominant: Option<(Color, usize)> = None;
        for &(bucket, count) in &buckets {
            if dominant.is_none_or(|(_, best)| count > best) {
                dominant = Some((bucket, count));
            }
        }
        let (dominant, _) = dominant?;

        let matched: Vec<Color> = border
            .iter()
            .copied()
            .filter(|px| px.quantize(self.quantize_step) == dominant)
            .collect();
        if matched.is_empty() {
            return Some(dominant);
        }

        let n = matched.len() as u64;
        let sum = |channel: fn(&Color) -> u8| matched.iter().map(|c| channel(c) as u64).sum::<u64>();
        Some(Color::new(
            (sum(|c| c.r) / n) as u8,
            (sum(|c| c.g) / n) as u8,
            (sum(|c| c.b) / n) as u8,
        ))
    }

    /// Percentile border distance to `background` plus a margin, clamped to
    /// the configured bounds and truncated.
    pub fn estimate_tolerance(&self, image: &RgbImage, background: Color) -> u32 {
        let mut distances: Vec<f64> = border_pixels(image)
            .into_iter()
            .map(|px| px.distance(background))
            .collect();
        if distances.is_empty() {
            return self.fallback_tolerance;
        }
        distances.sort_by(f64::total_cmp);

        let idx = (self.percentile * (distances.len() - 1) as f64) as usize;
        let noise = distances[idx.min(distances.len() - 1)];
        let tolerance = (noise + self.tolerance_margin)
            .min(self.max_tolerance as f64)
            .max(self.min_tolerance as f64);
        tolerance as u32
    }

    /// Background color and tolerance together
    pub fn estimate(&self, image: &RgbImage) -> Result<BackgroundEstimate> {
        self.validate()?;
        let color = self
            .estimate_background_color(image)
            .ok_or(CutoutError::EmptyImage)?;
        let tolerance = self.estimate_tolerance(image, color);
        debug!(%color, tolerance, "estimated background");
        Ok(BackgroundEstimate { color, tolerance })
    }
}
