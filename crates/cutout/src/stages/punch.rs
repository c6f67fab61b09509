//! Screen punch: make the detected screen area of a cutout transparent.

use image::{RgbaImage, buffer::ConvertBuffer};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{
    algorithms::{GaussianBlurProcessor, GreenScreenDetector, PunchRect, subtract_hole},
    error::Result,
    stages::shell::{alpha_channel, apply_alpha},
    traits::AlphaProcessor,
    types::{BoundingBox, CropOffset},
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct PunchConfig {
    pub detector: GreenScreenDetector,
    /// Offset of the cutout inside the original image
    pub crop_offset: CropOffset,
    /// Pixels added around the detected screen on every side
    pub expand: i64,
    pub min_radius: u32,
    /// Corner radius as a fraction of the shorter rectangle side
    pub radius_fraction: f64,
    /// Blur applied to the hole edge
    pub hole_sigma: f32,
}

impl Default for PunchConfig {
    fn default() -> Self {
        Self {
            detector: GreenScreenDetector::default(),
            crop_offset: CropOffset::new(24, 24),
            expand: 14,
            min_radius: 14,
            radius_fraction: 0.10,
            hole_sigma: 1.1,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PunchedCutout {
    pub image: RgbaImage,
    /// Screen bounding box in original coordinates
    pub screen: BoundingBox,
    /// Punched rectangle in cutout coordinates
    pub rect: PunchRect,
    pub radius: u32,
}

#[derive(Debug, Clone, Default)]
pub struct ScreenPuncher {
    pub config: PunchConfig,
}

impl ScreenPuncher {
    pub fn new(config: PunchConfig) -> Self {
        Self { config }
    }

    /// Detect the screen in `original` and punch it out of `cutout`
    pub fn punch(&self, original: &RgbaImage, cutout: &RgbaImage) -> Result<PunchedCutout> {
        let rgb: image::RgbImage = original.convert();
        let screen = self.config.detector.detect(&rgb)?;
        self.punch_detected(screen, cutout)
    }

    /// Punch a screen already located at `screen` (original coordinates)
    pub fn punch_detected(&self, screen: BoundingBox, cutout: &RgbaImage) -> Result<PunchedCutout> {
        let config = &self.config;
        let (width, height) = cutout.dimensions();

        let rect = PunchRect::translate(screen, config.crop_offset, config.expand, width, height)?;
        let radius = rect.corner_radius(config.min_radius, config.radius_fraction);

        let hole = rect.rounded_hole(width, height, radius);
        let hole = GaussianBlurProcessor { sigma: config.hole_sigma }.process(&hole)?;

        let alpha = subtract_hole(&alpha_channel(cutout), &hole);
        let mut image = cutout.clone();
        apply_alpha(&mut image, &alpha)?;

        info!(%screen, %rect, radius, offset = %config.crop_offset, "punched screen");
        Ok(PunchedCutout { image, screen, rect, radius })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CutoutError;
    use image::Rgba;

    const GREEN: Rgba<u8> = Rgba([30, 210, 50, 255]);
    const BODY: Rgba<u8> = Rgba([70, 70, 70, 255]);

    /// 240x200 original with a green screen at (50..=150, 50..=150)
    fn original() -> RgbaImage {
        RgbaImage::from_fn(240, 200, |x, y| {
            if (50..=150).contains(&x) && (50..=150).contains(&y) { GREEN } else { BODY }
        })
    }

    /// Opaque cutout as if cropped from the original at (24, 24)
    fn cutout() -> RgbaImage {
        RgbaImage::from_pixel(192, 160, BODY)
    }

    #[test]
    fn test_punch_scenario() {
        let punched = ScreenPuncher::default()
            .punch(&original(), &cutout())
            .expect("Should punch");

        assert_eq!(punched.screen, BoundingBox { min_x: 50, min_y: 50, max_x: 150, max_y: 150 });
        assert_eq!(punched.rect, PunchRect { x0: 12, y0: 12, x1: 140, y1: 140 });
        assert_eq!(punched.radius, 14);

        let alpha = |x, y| punched.image.get_pixel(x, y)[3];
        assert_eq!(alpha(76, 76), 0);
        assert_eq!(alpha(2, 2), 255);
        assert_eq!(alpha(180, 150), 255);
        // Rounded corner keeps the rectangle's exact corner mostly opaque.
        assert!(alpha(12, 12) > 128);
        // Color channels untouched.
        assert_eq!(punched.image.get_pixel(76, 76)[0], 70);
    }

    #[test]
    fn test_transparent_pixels_stay_transparent() {
        let mut cut = cutout();
        cut.put_pixel(0, 0, Rgba([70, 70, 70, 0]));
        let punched = ScreenPuncher::default().punch(&original(), &cut).expect("Should punch");
        assert_eq!(punched.image.get_pixel(0, 0)[3], 0);
    }

    #[test]
    fn test_no_screen_fails() {
        let original = RgbaImage::from_pixel(100, 100, BODY);
        let err = ScreenPuncher::default().punch(&original, &cutout()).unwrap_err();
        assert!(matches!(err, CutoutError::InsufficientDetection { found: 0, .. }));
    }

    #[test]
    fn test_screen_outside_cutout_is_degenerate() {
        let config = PunchConfig { crop_offset: CropOffset::new(200, 200), expand: 0, ..Default::default() };
        let err = ScreenPuncher::new(config).punch(&original(), &cutout()).unwrap_err();
        assert!(matches!(err, CutoutError::DegenerateGeometry { .. }));
    }
}
