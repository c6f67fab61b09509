pub mod statistics;
pub mod region;
pub mod components;
pub mod refinement;
pub mod screen;

pub use statistics::*;
pub use region::*;
pub use components::*;
pub use refinement::*;
pub use screen::*;

/// Linear indices of the border pixels: top and bottom row pixel pairs for
/// each column, then left and right column pixel pairs for each row.
/// Corners are visited twice.
pub fn border_indices(width: u32, height: u32) -> Vec<usize> {
    if width == 0 || height == 0 {
        return Vec::new();
    }

    let w = width as usize;
    let h = height as usize;
    let mut indices = Vec::with_capacity(2 * (w + h));

    for x in 0..w {
        indices.push(x);
        indices.push((h - 1) * w + x);
    }
    for y in 0..h {
        indices.push(y * w);
        indices.push(y * w + (w - 1));
    }

    indices
}

/// 4-connected neighbours of `idx` (left, right, up, down), bounds-checked
#[inline]
pub(crate) fn neighbors4(idx: usize, width: usize, height: usize) -> impl Iterator<Item = usize> {
    let x = idx % width;
    let y = idx / width;

    let left = (x > 0).then(|| idx - 1);
    let right = (x + 1 < width).then(|| idx + 1);
    let up = (y > 0).then(|| idx - width);
    let down = (y + 1 < height).then(|| idx + width);

    [left, right, up, down].into_iter().flatten()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_border_indices_visit_corners_twice() {
        let indices = border_indices(3, 3);
        assert_eq!(indices.len(), 12);
        assert_eq!(indices.iter().filter(|&&i| i == 0).count(), 2);
        assert_eq!(indices.iter().filter(|&&i| i == 8).count(), 2);
        // Interior pixel never sampled.
        assert!(!indices.contains(&4));
    }

    #[test]
    fn test_border_indices_empty_image() {
        assert!(border_indices(0, 5).is_empty());
    }

    #[test]
    fn test_neighbors_respect_bounds() {
        let corner: Vec<usize> = neighbors4(0, 4, 3).collect();
        assert_eq!(corner, vec![1, 4]);

        let centre: Vec<usize> = neighbors4(5, 4, 3).collect();
        assert_eq!(centre, vec![4, 6, 1, 9]);

        let last: Vec<usize> = neighbors4(11, 4, 3).collect();
        assert_eq!(last, vec![10, 7]);
    }
}
