use std::fmt;
use std::str::FromStr;

use image::{GrayImage, Luma, Rgb};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::{CutoutError, Result};

/// An 8-bit RGB color with no alpha
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Floor every channel to a multiple of `step`
    pub fn quantize(self, step: u8) -> Self {
        let step = step.max(1);
        Self {
            r: (self.r / step) * step,
            g: (self.g / step) * step,
            b: (self.b / step) * step,
        }
    }

    /// Squared Euclidean RGB distance. Exact, so it can be compared against a
    /// squared integer tolerance.
    pub fn distance_sq(self, other: Color) -> u32 {
        let dr = self.r as i32 - other.r as i32;
        let dg = self.g as i32 - other.g as i32;
        let db = self.b as i32 - other.b as i32;
        (dr * dr + dg * dg + db * db) as u32
    }

    /// Euclidean RGB distance
    pub fn distance(self, other: Color) -> f64 {
        (self.distance_sq(other) as f64).sqrt()
    }
}

impl From<Rgb<u8>> for Color {
    fn from(pixel: Rgb<u8>) -> Self {
        let [r, g, b] = pixel.0;
        Self { r, g, b }
    }
}

impl From<&Rgb<u8>> for Color {
    fn from(pixel: &Rgb<u8>) -> Self {
        Self::from(*pixel)
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.r, self.g, self.b)
    }
}

/// Inclusive axis-aligned rectangle in pixel coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct BoundingBox {
    pub min_x: u32,
    pub min_y: u32,
    pub max_x: u32,
    pub max_y: u32,
}

impl BoundingBox {
    pub fn width(&self) -> u32 {
        self.max_x - self.min_x + 1
    }

    pub fn height(&self) -> u32 {
        self.max_y - self.min_y + 1
    }

    /// Grow to include `(x, y)`
    fn include(bbox: &mut Option<Self>, x: u32, y: u32) {
        match bbox {
            Some(b) => {
                b.min_x = b.min_x.min(x);
                b.min_y = b.min_y.min(y);
                b.max_x = b.max_x.max(x);
                b.max_y = b.max_y.max(y);
            }
            None => {
                *bbox = Some(Self {
                    min_x: x,
                    min_y: y,
                    max_x: x,
                    max_y: y,
                })
            }
        }
    }

    /// Bounding box of every non-zero pixel of an alpha channel
    pub fn of_alpha(alpha: &GrayImage) -> Option<Self> {
        let mut bbox = None;
        for (x, y, pixel) in alpha.enumerate_pixels() {
            if pixel[0] > 0 {
                Self::include(&mut bbox, x, y);
            }
        }
        bbox
    }
}

impl fmt::Display for BoundingBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({}, {}, {}, {})",
            self.min_x, self.min_y, self.max_x, self.max_y
        )
    }
}

/// Position of a cropped cutout inside the image it was cropped from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
pub struct CropOffset {
    pub x: i64,
    pub y: i64,
}

impl CropOffset {
    pub const fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }
}

impl FromStr for CropOffset {
    type Err = CutoutError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || CutoutError::InvalidConfig(format!("crop offset must be like '24,24', got '{s}'"));
        let (x, y) = s.split_once(',').ok_or_else(invalid)?;
        let x = x.trim().parse().map_err(|_| invalid())?;
        let y = y.trim().parse().map_err(|_| invalid())?;
        Ok(Self { x, y })
    }
}

impl fmt::Display for CropOffset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.x, self.y)
    }
}

/// Dense binary mask, one flag per pixel, addressed by `y * width + x`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mask {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl Mask {
    /// All-false mask
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![0; width as usize * height as usize],
        }
    }

    /// Build a mask by evaluating `f(x, y)` for every pixel
    pub fn from_fn<F>(width: u32, height: u32, mut f: F) -> Self
    where
        F: FnMut(u32, u32) -> bool,
    {
        let mut mask = Self::new(width, height);
        for y in 0..height {
            for x in 0..width {
                if f(x, y) {
                    mask.set(mask.index(x, y));
                }
            }
        }
        mask
    }

    /// Pixels with non-zero alpha are set
    pub fn from_alpha(alpha: &GrayImage) -> Self {
        Self {
            width: alpha.width(),
            height: alpha.height(),
            data: alpha.pixels().map(|p| u8::from(p[0] > 0)).collect(),
        }
    }

    /// 0/255 alpha image
    pub fn to_alpha(&self) -> GrayImage {
        GrayImage::from_fn(self.width, self.height, |x, y| {
            Luma([if self.is_set(self.index(x, y)) { 255 } else { 0 }])
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    #[inline]
    pub fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }

    #[inline]
    pub fn is_set(&self, idx: usize) -> bool {
        self.data[idx] != 0
    }

    #[inline]
    pub fn set(&mut self, idx: usize) {
        self.data[idx] = 1;
    }

    /// Number of set pixels
    pub fn count(&self) -> usize {
        self.data.iter().filter(|&&v| v != 0).count()
    }

    /// Flip every flag
    pub fn complement(&self) -> Self {
        Self {
            width: self.width,
            height: self.height,
            data: self.data.iter().map(|&v| u8::from(v == 0)).collect(),
        }
    }

    pub fn bounding_box(&self) -> Option<BoundingBox> {
        let mut bbox = None;
        for (idx, _) in self.data.iter().enumerate().filter(|&(_, &v)| v != 0) {
            let x = (idx % self.width as usize) as u32;
            let y = (idx / self.width as usize) as u32;
            BoundingBox::include(&mut bbox, x, y);
        }
        bbox
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }
}

/// Fail unless two buffers share the same dimensions
pub fn ensure_dimensions(expected: (u32, u32), actual: (u32, u32)) -> Result<()> {
    if expected != actual {
        return Err(CutoutError::DimensionMismatch { expected, actual });
    }
    Ok(())
}
