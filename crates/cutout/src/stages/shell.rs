//! Shell extraction: segment the device from its background and crop it.

use image::{GrayImage, RgbaImage, buffer::ConvertBuffer, imageops};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::{
    algorithms::{BackgroundEstimator, RegionGrower, largest_component},
    error::Result,
    pipeline::builder::AlphaPipelineBuilder,
    types::{BoundingBox, Color, CropOffset},
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct ShellConfig {
    pub estimator: BackgroundEstimator,
    /// Crop the cutout to the alpha bounding box
    pub crop: bool,
    /// Margin kept around the bounding box when cropping
    pub padding: u32,
    /// Square close neighbourhood side length
    pub close_extent: u8,
    pub blur_sigma: f32,
    pub alpha_threshold: u8,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            estimator: BackgroundEstimator::default(),
            crop: true,
            padding: 24,
            close_extent: 3,
            blur_sigma: 0.8,
            alpha_threshold: 96,
        }
    }
}

/// Result of a shell extraction
#[derive(Debug, Clone)]
pub struct ShellCutout {
    /// The RGBA cutout, cropped when configured
    pub image: RgbaImage,
    /// Refined alpha at the original canvas size
    pub alpha: GrayImage,
    pub background: Color,
    pub tolerance: u32,
    /// Pixels of the largest component before refinement
    pub kept_pixels: usize,
    /// Alpha bounding box in original coordinates
    pub bounding_box: Option<BoundingBox>,
    /// Where `image` sits inside the original; zero when not cropped
    pub crop_offset: CropOffset,
}

#[derive(Debug, Clone, Default)]
pub struct ShellExtractor {
    pub config: ShellConfig,
}

impl ShellExtractor {
    pub fn new(config: ShellConfig) -> Self {
        Self { config }
    }

    pub fn extract(&self, source: &RgbaImage) -> Result<ShellCutout> {
        let config = &self.config;
        let rgb: image::RgbImage = source.convert();

        let estimate = config.estimator.estimate(&rgb)?;
        let background = RegionGrower::new(estimate.color, estimate.tolerance).grow(&rgb);
        let object = background.complement();
        let component = largest_component(&object);
        let kept_pixels = component.count();
        if kept_pixels == 0 {
            warn!(
                tolerance = estimate.tolerance,
                "no foreground found; output will be fully transparent"
            );
        }

        let pipeline = AlphaPipelineBuilder::build_shell(
            config.close_extent,
            config.blur_sigma,
            config.alpha_threshold,
        );
        debug!("{}", pipeline.info());
        let alpha = pipeline.refine(&component)?;

        let mut image = source.clone();
        apply_alpha(&mut image, &alpha)?;

        let bounding_box = BoundingBox::of_alpha(&alpha);
        let mut crop_offset = CropOffset::default();
        if let (true, Some(bbox)) = (config.crop, bounding_box) {
            let (x, y, w, h) = padded_crop(bbox, config.padding, image.width(), image.height());
            image = imageops::crop_imm(&image, x, y, w, h).to_image();
            crop_offset = CropOffset::new(x as i64, y as i64);
        }

        info!(
            background = %estimate.color,
            tolerance = estimate.tolerance,
            kept_pixels,
            "extracted shell"
        );

        Ok(ShellCutout {
            image,
            alpha,
            background: estimate.color,
            tolerance: estimate.tolerance,
            kept_pixels,
            bounding_box,
            crop_offset,
        })
    }
}

/// Replace the alpha channel of `image` with `alpha`
pub fn apply_alpha(image: &mut RgbaImage, alpha: &GrayImage) -> Result<()> {
    crate::types::ensure_dimensions(image.dimensions(), alpha.dimensions())?;
    for (pixel, a) in image.pixels_mut().zip(alpha.pixels()) {
        pixel[3] = a[0];
    }
    Ok(())
}

/// Alpha channel of an RGBA image
pub fn alpha_channel(image: &RgbaImage) -> GrayImage {
    GrayImage::from_fn(image.width(), image.height(), |x, y| {
        image::Luma([image.get_pixel(x, y)[3]])
    })
}

/// `(x, y, width, height)` of `bbox` grown by `padding`, clipped to the image
pub fn padded_crop(bbox: BoundingBox, padding: u32, width: u32, height: u32) -> (u32, u32, u32, u32) {
    let left = bbox.min_x.saturating_sub(padding);
    let top = bbox.min_y.saturating_sub(padding);
    let right = (bbox.max_x + 1).saturating_add(padding).min(width);
    let bottom = (bbox.max_y + 1).saturating_add(padding).min(height);
    (left, top, right - left, bottom - top)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn gray_with_square() -> RgbaImage {
        RgbaImage::from_fn(10, 10, |x, y| {
            if (3..7).contains(&x) && (3..7).contains(&y) {
                Rgba([0, 0, 0, 255])
            } else {
                Rgba([200, 200, 200, 255])
            }
        })
    }

    #[test]
    fn test_solid_gray_is_fully_transparent() {
        let source = RgbaImage::from_pixel(10, 10, Rgba([128, 128, 128, 255]));
        let cutout = ShellExtractor::default().extract(&source).expect("Should extract");

        assert_eq!(cutout.background, Color::new(128, 128, 128));
        assert_eq!(cutout.tolerance, 16);
        assert_eq!(cutout.kept_pixels, 0);
        assert_eq!(cutout.bounding_box, None);
        assert_eq!(cutout.crop_offset, CropOffset::default());
        assert_eq!(cutout.image.dimensions(), (10, 10));
        assert!(cutout.image.pixels().all(|p| p[3] == 0));
    }

    #[test]
    fn test_square_on_gray() {
        let config = ShellConfig { crop: false, ..Default::default() };
        let cutout = ShellExtractor::new(config).extract(&gray_with_square()).expect("Should extract");

        assert_eq!(cutout.background, Color::new(200, 200, 200));
        assert_eq!(cutout.kept_pixels, 16);
        assert_eq!(
            cutout.bounding_box,
            Some(BoundingBox { min_x: 3, min_y: 3, max_x: 6, max_y: 6 })
        );
        assert_eq!(cutout.image.get_pixel(4, 4)[3], 255);
        assert_eq!(cutout.image.get_pixel(0, 0)[3], 0);
        // Color channels untouched.
        assert_eq!(cutout.image.get_pixel(0, 0)[0], 200);
    }

    #[test]
    fn test_crop_with_padding() {
        let config = ShellConfig { padding: 1, ..Default::default() };
        let cutout = ShellExtractor::new(config).extract(&gray_with_square()).expect("Should extract");

        assert_eq!(cutout.crop_offset, CropOffset::new(2, 2));
        assert_eq!(cutout.image.dimensions(), (6, 6));
        assert_eq!(cutout.alpha.dimensions(), (10, 10));
        assert_eq!(cutout.image.get_pixel(1, 1)[3], 255);
        assert_eq!(cutout.image.get_pixel(0, 0)[3], 0);
    }

    #[test]
    fn test_default_padding_clips_to_image() {
        let cutout = ShellExtractor::default().extract(&gray_with_square()).expect("Should extract");
        assert_eq!(cutout.crop_offset, CropOffset::new(0, 0));
        assert_eq!(cutout.image.dimensions(), (10, 10));
    }

    #[test]
    fn test_keeps_only_largest_blob() {
        let source = RgbaImage::from_fn(30, 20, |x, y| {
            let big = (4..14).contains(&x) && (4..14).contains(&y);
            let small = (20..24).contains(&x) && (8..12).contains(&y);
            if big || small { Rgba([20, 30, 200, 255]) } else { Rgba([240, 240, 240, 255]) }
        });
        let config = ShellConfig { crop: false, ..Default::default() };
        let cutout = ShellExtractor::new(config).extract(&source).expect("Should extract");

        assert_eq!(cutout.kept_pixels, 100);
        assert_eq!(cutout.image.get_pixel(21, 9)[3], 0);
        assert_eq!(cutout.image.get_pixel(8, 8)[3], 255);
    }

    #[test]
    fn test_padded_crop() {
        let bbox = BoundingBox { min_x: 30, min_y: 5, max_x: 69, max_y: 90 };
        assert_eq!(padded_crop(bbox, 24, 100, 100), (6, 0, 88, 100));
    }

    #[test]
    fn test_apply_alpha_dimension_mismatch() {
        let mut image = RgbaImage::new(4, 4);
        let alpha = GrayImage::new(3, 4);
        assert!(apply_alpha(&mut image, &alpha).is_err());
    }
}
