//! Border-seeded flood fill that grows the background region.

use std::collections::VecDeque;

use image::RgbImage;
use tracing::debug;

use crate::{
    algorithms::{border_indices, neighbors4},
    types::{Color, Mask},
};

/// Grows a background mask from the image border through pixels whose color
/// lies within `tolerance` of `background`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegionGrower {
    pub background: Color,
    pub tolerance: u32,
}

impl RegionGrower {
    pub fn new(background: Color, tolerance: u32) -> Self {
        Self { background, tolerance }
    }

    /// Breadth-first multi-source fill. Every pixel is enqueued at most once.
    pub fn grow(&self, image: &RgbImage) -> Mask {
        let (width, height) = image.dimensions();
        let w = width as usize;
        let h = height as usize;
        let pixels = image.as_raw();
        let limit = self.tolerance as u64 * self.tolerance as u64;

        let within = |idx: usize| {
            let px = Color::new(pixels[idx * 3], pixels[idx * 3 + 1], pixels[idx * 3 + 2]);
            px.distance_sq(self.background) as u64 <= limit
        };

        let mut mask = Mask::new(width, height);
        let mut queue = VecDeque::new();

        for idx in border_indices(width, height) {
            if !mask.is_set(idx) && within(idx) {
                mask.set(idx);
                queue.push_back(idx);
            }
        }
        let seeds = queue.len();

        while let Some(idx) = queue.pop_front() {
            for n in neighbors4(idx, w, h) {
                if !mask.is_set(n) && within(n) {
                    mask.set(n);
                    queue.push_back(n);
                }
            }
        }

        debug!(seeds, background_pixels = mask.count(), "flood fill finished");
        mask
    }
}

/// Background mask of `image` for the given color and tolerance
pub fn flood_background(image: &RgbImage, background: Color, tolerance: u32) -> Mask {
    RegionGrower::new(background, tolerance).grow(image)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn test_solid_image_is_all_background() {
        let image = RgbImage::from_pixel(10, 10, Rgb([128, 128, 128]));
        let mask = flood_background(&image, Color::new(128, 128, 128), 16);
        assert_eq!(mask.count(), 100);
        assert_eq!(mask.complement().count(), 0);
    }

    #[test]
    fn test_square_stays_foreground() {
        let image = RgbImage::from_fn(10, 10, |x, y| {
            if (3..7).contains(&x) && (3..7).contains(&y) {
                Rgb([0, 0, 0])
            } else {
                Rgb([200, 200, 200])
            }
        });
        let mask = flood_background(&image, Color::new(200, 200, 200), 16);
        let object = mask.complement();
        assert_eq!(object.count(), 16);
        let bbox = object.bounding_box().expect("Should have a foreground");
        assert_eq!((bbox.min_x, bbox.min_y, bbox.max_x, bbox.max_y), (3, 3, 6, 6));
    }

    #[test]
    fn test_enclosed_background_colored_pixels_not_reached() {
        // A ring of red encloses a gray pocket that matches the background.
        let image = RgbImage::from_fn(9, 9, |x, y| {
            let ring = (2..=6).contains(&x)
                && (2..=6).contains(&y)
                && (x == 2 || x == 6 || y == 2 || y == 6);
            if ring { Rgb([255, 0, 0]) } else { Rgb([100, 100, 100]) }
        });
        let mask = flood_background(&image, Color::new(100, 100, 100), 20);
        let pocket = mask.index(4, 4);
        assert!(!mask.is_set(pocket), "fill must not jump over the ring");
        // 81 pixels minus 16 ring pixels minus 9 pocket pixels.
        assert_eq!(mask.count(), 56);
    }

    #[test]
    fn test_gradient_is_followed_only_within_tolerance() {
        // Each column darkens by 10; distance grows by sqrt(3)*10 per column.
        let image = RgbImage::from_fn(8, 1, |x, _| {
            let v = 200 - 10 * x as u8;
            Rgb([v, v, v])
        });
        let mask = flood_background(&image, Color::new(200, 200, 200), 40);
        // Every pixel of a single row is a seed candidate; only columns 0..=2
        // lie within sqrt(3)*20 = 34.6.
        let marked: Vec<bool> = (0..8).map(|i| mask.is_set(i)).collect();
        assert_eq!(marked, vec![true, true, true, false, false, false, false, false]);
    }

    #[test]
    fn test_zero_tolerance_exact_match() {
        let mut image = RgbImage::from_pixel(4, 4, Rgb([50, 50, 50]));
        image.put_pixel(0, 0, Rgb([51, 50, 50]));
        let mask = flood_background(&image, Color::new(50, 50, 50), 0);
        assert_eq!(mask.count(), 15);
    }
}
