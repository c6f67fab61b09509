use image::GrayImage;
use crate::{error::Result, types::Mask};

/// Trait for alpha-channel processing steps (close, blur, threshold)
pub trait AlphaProcessor: Send + Sync {
    /// Process the input alpha channel into a new one
    fn process(&self, alpha: &GrayImage) -> Result<GrayImage>;

    /// Short human-readable name used in pipeline summaries
    fn name(&self) -> String;
}

/// Trait for choosing which connected components of a mask survive
pub trait ComponentSelector: Send + Sync {
    /// Return a fresh mask containing only the selected components
    fn select(&self, mask: &Mask) -> Mask;
}
