use image::GrayImage;
use imageproc::distance_transform::Norm;
use serde::{Deserialize, Serialize};

use crate::{
    error::{CutoutError, Result},
    traits::AlphaProcessor,
};

/// Morphological close (dilate then erode) with a square neighbourhood
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CloseProcessor {
    /// Side length of the square neighbourhood; must be odd
    pub extent: u8,
}

impl Default for CloseProcessor {
    fn default() -> Self {
        Self { extent: 3 }
    }
}

impl AlphaProcessor for CloseProcessor {
    fn process(&self, alpha: &GrayImage) -> Result<GrayImage> {
        if self.extent == 0 || self.extent % 2 == 0 {
            return Err(CutoutError::InvalidConfig(format!(
                "close extent must be odd, got {}",
                self.extent
            )));
        }
        let radius = self.extent / 2;
        let dilated = imageproc::morphology::dilate(alpha, Norm::LInf, radius);
        Ok(imageproc::morphology::erode(&dilated, Norm::LInf, radius))
    }

    fn name(&self) -> String {
        format!("Close({})", self.extent)
    }
}

/// Gaussian blur to soften binary edges
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GaussianBlurProcessor {
    pub sigma: f32,
}

impl Default for GaussianBlurProcessor {
    fn default() -> Self {
        Self { sigma: 0.8 }
    }
}

impl AlphaProcessor for GaussianBlurProcessor {
    fn process(&self, alpha: &GrayImage) -> Result<GrayImage> {
        if self.sigma.is_nan() || self.sigma <= 0.0 {
            return Err(CutoutError::InvalidConfig(format!(
                "blur sigma must be positive, got {}",
                self.sigma
            )));
        }
        Ok(imageproc::filter::gaussian_blur_f32(alpha, self.sigma))
    }

    fn name(&self) -> String {
        format!("GaussianBlur({})", self.sigma)
    }
}

/// Binary threshold: values above the cutoff become 255, the rest 0
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThresholdProcessor {
    pub threshold: u8,
}

impl Default for ThresholdProcessor {
    fn default() -> Self {
        Self { threshold: 96 }
    }
}

impl AlphaProcessor for ThresholdProcessor {
    fn process(&self, alpha: &GrayImage) -> Result<GrayImage> {
        Ok(imageproc::contrast::threshold(alpha, self.threshold))
    }

    fn name(&self) -> String {
        format!("Threshold({})", self.threshold)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    fn square(size: u32, lo: u32, hi: u32) -> GrayImage {
        GrayImage::from_fn(size, size, |x, y| {
            let inside = (lo..=hi).contains(&x) && (lo..=hi).contains(&y);
            Luma([if inside { 255 } else { 0 }])
        })
    }

    #[test]
    fn test_close_fills_single_pixel_gap() {
        let mut alpha = square(12, 2, 9);
        alpha.put_pixel(5, 5, Luma([0]));
        let closed = CloseProcessor::default().process(&alpha).unwrap();
        assert_eq!(closed.get_pixel(5, 5)[0], 255);
        assert_eq!(closed, square(12, 2, 9));
    }

    #[test]
    fn test_close_rejects_even_extent() {
        let alpha = square(4, 1, 2);
        assert!(CloseProcessor { extent: 2 }.process(&alpha).is_err());
        assert!(CloseProcessor { extent: 0 }.process(&alpha).is_err());
    }

    #[test]
    fn test_blur_softens_edges() {
        let alpha = square(12, 3, 8);
        let blurred = GaussianBlurProcessor::default().process(&alpha).unwrap();
        let edge = blurred.get_pixel(2, 5)[0];
        assert!(edge > 0 && edge < 255, "edge value {edge} should be soft");
        assert!(blurred.get_pixel(5, 5)[0] > 200);
    }

    #[test]
    fn test_blur_rejects_non_positive_sigma() {
        let alpha = square(4, 1, 2);
        assert!(GaussianBlurProcessor { sigma: 0.0 }.process(&alpha).is_err());
        assert!(GaussianBlurProcessor { sigma: f32::NAN }.process(&alpha).is_err());
    }

    #[test]
    fn test_threshold_is_strict() {
        let alpha = GrayImage::from_fn(3, 1, |x, _| Luma([[95u8, 96, 97][x as usize]]));
        let out = ThresholdProcessor::default().process(&alpha).unwrap();
        let values: Vec<u8> = out.pixels().map(|p| p[0]).collect();
        assert_eq!(values, vec![0, 0, 255]);
    }
}
