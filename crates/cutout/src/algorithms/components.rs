//! 4-connected component labelling over binary masks.
//!
//! Components are never materialised as pixel lists: pass one ranks them by
//! (seed, size) and pass two re-floods the chosen seeds into a fresh mask.

use std::collections::VecDeque;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{algorithms::neighbors4, traits::ComponentSelector, types::Mask};

/// A connected component, identified by its first pixel in row-major order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Component {
    pub seed: usize,
    pub size: usize,
}

/// Every component of `mask` in discovery (row-major seed) order
pub fn components(mask: &Mask) -> Vec<Component> {
    let (w, h) = (mask.width() as usize, mask.height() as usize);
    let mut visited = Mask::new(mask.width(), mask.height());
    let mut queue = VecDeque::new();
    let mut found = Vec::new();

    for seed in 0..mask.len() {
        if !mask.is_set(seed) || visited.is_set(seed) {
            continue;
        }

        visited.set(seed);
        queue.push_back(seed);
        let mut size = 0;

        while let Some(idx) = queue.pop_front() {
            size += 1;
            for n in neighbors4(idx, w, h) {
                if mask.is_set(n) && !visited.is_set(n) {
                    visited.set(n);
                    queue.push_back(n);
                }
            }
        }

        found.push(Component { seed, size });
    }

    found
}

/// Flood the component containing `seed` from `mask` into `keep`
fn fill_component(mask: &Mask, seed: usize, keep: &mut Mask) {
    let (w, h) = (mask.width() as usize, mask.height() as usize);
    let mut queue = VecDeque::from([seed]);
    keep.set(seed);

    while let Some(idx) = queue.pop_front() {
        for n in neighbors4(idx, w, h) {
            if mask.is_set(n) && !keep.is_set(n) {
                keep.set(n);
                queue.push_back(n);
            }
        }
    }
}

/// Mask holding only the largest component. On equal sizes the component
/// found first in row-major order wins; that tie-break is arbitrary but
/// keeps the output deterministic. An empty input gives an empty mask.
pub fn largest_component(mask: &Mask) -> Mask {
    let mut best: Option<Component> = None;
    for component in components(mask) {
        if best.is_none_or(|b| component.size > b.size) {
            best = Some(component);
        }
    }

    let mut keep = Mask::new(mask.width(), mask.height());
    if let Some(best) = best {
        debug!(seed = best.seed, size = best.size, "largest component");
        fill_component(mask, best.seed, &mut keep);
    }
    keep
}

/// Mask holding every component with at least `min_area` pixels
pub fn large_components(mask: &Mask, min_area: usize) -> Mask {
    let all = components(mask);
    let mut keep = Mask::new(mask.width(), mask.height());

    let mut kept = 0;
    for component in all.iter().filter(|c| c.size >= min_area) {
        fill_component(mask, component.seed, &mut keep);
        kept += 1;
    }

    debug!(total = all.len(), kept, min_area, "filtered components by area");
    keep
}

/// Keeps the single largest component
#[derive(Debug, Clone, Copy, Default)]
pub struct LargestComponent;

impl ComponentSelector for LargestComponent {
    fn select(&self, mask: &Mask) -> Mask {
        largest_component(mask)
    }
}

/// Keeps every component of at least `min_area` pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct LargeComponents {
    pub min_area: usize,
}

impl Default for LargeComponents {
    fn default() -> Self {
        Self { min_area: 400 }
    }
}

impl ComponentSelector for LargeComponents {
    fn select(&self, mask: &Mask) -> Mask {
        large_components(mask, self.min_area)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rect(x0: u32, y0: u32, x1: u32, y1: u32) -> impl Fn(u32, u32) -> bool {
        move |x, y| (x0..=x1).contains(&x) && (y0..=y1).contains(&y)
    }

    /// Three blobs: 2x2 at the top-left, 3x3 in the middle, 1x4 at the right
    fn three_blobs() -> Mask {
        let a = rect(0, 0, 1, 1);
        let b = rect(4, 3, 6, 5);
        let c = rect(9, 0, 9, 3);
        Mask::from_fn(10, 8, |x, y| a(x, y) || b(x, y) || c(x, y))
    }

    #[test]
    fn test_components_in_discovery_order() {
        let found = components(&three_blobs());
        let sizes: Vec<usize> = found.iter().map(|c| c.size).collect();
        assert_eq!(sizes, vec![4, 4, 9]);
        assert_eq!(found[0].seed, 0);
        assert_eq!(found[1].seed, 9);
    }

    #[test]
    fn test_largest_component_keeps_biggest_blob() {
        let keep = largest_component(&three_blobs());
        assert_eq!(keep, Mask::from_fn(10, 8, rect(4, 3, 6, 5)));
    }

    #[test]
    fn test_tie_keeps_lowest_index() {
        // Two 2x2 blobs; the right one starts on an earlier row.
        let a = rect(0, 3, 1, 4);
        let b = rect(6, 1, 7, 2);
        let mask = Mask::from_fn(8, 6, |x, y| a(x, y) || b(x, y));
        let keep = largest_component(&mask);
        assert_eq!(keep, Mask::from_fn(8, 6, rect(6, 1, 7, 2)));
    }

    #[test]
    fn test_idempotent() {
        for mask in [three_blobs(), Mask::new(5, 5), Mask::from_fn(4, 4, |x, y| (x + y) % 2 == 0)] {
            let once = largest_component(&mask);
            let twice = largest_component(&once);
            assert_eq!(once, twice);
        }
    }

    #[test]
    fn test_diagonal_pixels_are_separate() {
        let mask = Mask::from_fn(3, 3, |x, y| x == y);
        assert_eq!(components(&mask).len(), 3);
        assert_eq!(largest_component(&mask).count(), 1);
    }

    #[test]
    fn test_empty_mask() {
        let mask = Mask::new(6, 6);
        assert!(components(&mask).is_empty());
        assert_eq!(largest_component(&mask).count(), 0);
        assert_eq!(large_components(&mask, 1).count(), 0);
    }

    #[test]
    fn test_large_components_drops_fragments() {
        let keep = large_components(&three_blobs(), 4);
        assert_eq!(keep.count(), 17);

        let keep = large_components(&three_blobs(), 5);
        assert_eq!(keep, Mask::from_fn(10, 8, rect(4, 3, 6, 5)));
    }

    #[test]
    fn test_selectors() {
        let mask = three_blobs();
        assert_eq!(LargestComponent.select(&mask), largest_component(&mask));
        assert_eq!(LargeComponents { min_area: 9 }.select(&mask).count(), 9);
        assert_eq!(LargeComponents::default().select(&mask).count(), 0);
    }
}
