//! Screen detection and punch-hole geometry.

use image::{GrayImage, Luma, RgbImage};
use imageproc::{
    drawing::{draw_filled_circle_mut, draw_filled_rect_mut},
    rect::Rect,
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    error::{CutoutError, Result},
    types::{BoundingBox, CropOffset},
};

/// Finds the bounding box of green-dominant (CRT screen) pixels
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct GreenScreenDetector {
    /// Green must exceed this absolute level
    pub min_green: u8,
    /// Green must exceed red times this ratio
    pub red_ratio: f64,
    /// Green must exceed blue times this ratio
    pub blue_ratio: f64,
    /// Green minus red must exceed this
    pub min_green_red_diff: i32,
    /// Fewer matching pixels than this is a failed detection
    pub min_pixels: usize,
}

impl Default for GreenScreenDetector {
    fn default() -> Self {
        Self {
            min_green: 110,
            red_ratio: 1.2,
            blue_ratio: 1.15,
            min_green_red_diff: 30,
            min_pixels: 100,
        }
    }
}

impl GreenScreenDetector {
    #[inline]
    pub fn matches(&self, [r, g, b]: [u8; 3]) -> bool {
        g > self.min_green
            && g as f64 > r as f64 * self.red_ratio
            && g as f64 > b as f64 * self.blue_ratio
            && g as i32 - r as i32 > self.min_green_red_diff
    }

    /// Bounding box of all matching pixels
    pub fn detect(&self, image: &RgbImage) -> Result<BoundingBox> {
        let mut count = 0usize;
        let mut bbox: Option<BoundingBox> = None;

        for (x, y, pixel) in image.enumerate_pixels() {
            if !self.matches(pixel.0) {
                continue;
            }
            count += 1;
            bbox = Some(match bbox {
                Some(b) => BoundingBox {
                    min_x: b.min_x.min(x),
                    min_y: b.min_y.min(y),
                    max_x: b.max_x.max(x),
                    max_y: b.max_y.max(y),
                },
                None => BoundingBox { min_x: x, min_y: y, max_x: x, max_y: y },
            });
        }

        debug!(count, "green screen pixels");
        match bbox {
            Some(bbox) if count >= self.min_pixels => Ok(bbox),
            _ => Err(CutoutError::InsufficientDetection {
                found: count,
                required: self.min_pixels,
            }),
        }
    }
}

/// Inclusive rectangle to punch, in cutout coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct PunchRect {
    pub x0: u32,
    pub y0: u32,
    pub x1: u32,
    pub y1: u32,
}

impl PunchRect {
    /// Move `bbox` from original-image coordinates into a cutout of
    /// `width` x `height` cropped at `offset`, grow it by `expand` on every
    /// side and clip it to the cutout.
    pub fn translate(
        bbox: BoundingBox,
        offset: CropOffset,
        expand: i64,
        width: u32,
        height: u32,
    ) -> Result<Self> {
        let x0 = (bbox.min_x as i64 - offset.x - expand).max(0);
        let y0 = (bbox.min_y as i64 - offset.y - expand).max(0);
        let x1 = (bbox.max_x as i64 - offset.x + expand).min(width as i64 - 1);
        let y1 = (bbox.max_y as i64 - offset.y + expand).min(height as i64 - 1);

        if x1 <= x0 || y1 <= y0 {
            return Err(CutoutError::DegenerateGeometry { x0, y0, x1, y1 });
        }

        Ok(Self {
            x0: x0 as u32,
            y0: y0 as u32,
            x1: x1 as u32,
            y1: y1 as u32,
        })
    }

    pub fn width(&self) -> u32 {
        self.x1 - self.x0 + 1
    }

    pub fn height(&self) -> u32 {
        self.y1 - self.y0 + 1
    }

    /// `max(min_radius, trunc(fraction * shorter side))`
    pub fn corner_radius(&self, min_radius: u32, fraction: f64) -> u32 {
        let scaled = (self.width().min(self.height()) as f64 * fraction) as u32;
        min_radius.max(scaled)
    }

    /// Draw the rectangle with rounded corners as 255 on a zeroed
    /// `width` x `height` canvas.
    pub fn rounded_hole(&self, width: u32, height: u32, radius: u32) -> GrayImage {
        let mut hole = GrayImage::new(width, height);
        let fill = Luma([255u8]);

        let (w, h) = (self.width(), self.height());
        let r = radius.min((w - 1) / 2).min((h - 1) / 2);
        let (x0, y0, x1, y1) = (self.x0 as i32, self.y0 as i32, self.x1 as i32, self.y1 as i32);
        let ri = r as i32;

        // Horizontal band, full height between the corner arcs.
        draw_filled_rect_mut(&mut hole, Rect::at(x0 + ri, y0).of_size(w - 2 * r, h), fill);
        // Vertical band, full width between the corner arcs.
        draw_filled_rect_mut(&mut hole, Rect::at(x0, y0 + ri).of_size(w, h - 2 * r), fill);

        if r > 0 {
            for (cx, cy) in [
                (x0 + ri, y0 + ri),
                (x1 - ri, y0 + ri),
                (x0 + ri, y1 - ri),
                (x1 - ri, y1 - ri),
            ] {
                draw_filled_circle_mut(&mut hole, (cx, cy), ri, fill);
            }
        }

        hole
    }
}

impl std::fmt::Display for PunchRect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {}, {}, {})", self.x0, self.y0, self.x1, self.y1)
    }
}

/// `alpha * (255 - hole) / 255`, truncated
pub fn subtract_hole(alpha: &GrayImage, hole: &GrayImage) -> GrayImage {
    GrayImage::from_fn(alpha.width(), alpha.height(), |x, y| {
        let a = alpha.get_pixel(x, y)[0] as u32;
        let h = hole.get_pixel(x, y)[0] as u32;
        Luma([(a * (255 - h) / 255) as u8])
    })
}
