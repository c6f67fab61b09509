pub mod builder;

use image::GrayImage;
use crate::{
    error::Result,
    traits::AlphaProcessor,
    types::Mask,
};

/// An ordered chain of alpha processors that turns a binary mask into a
/// finished alpha channel
pub struct AlphaPipeline {
    processors: Vec<Box<dyn AlphaProcessor>>,
}

impl AlphaPipeline {
    /// Create a new pipeline builder
    pub fn builder() -> builder::AlphaPipelineBuilder {
        builder::AlphaPipelineBuilder::new()
    }

    /// Create a new pipeline with the given processors
    pub fn new(processors: Vec<Box<dyn AlphaProcessor>>) -> Self {
        Self { processors }
    }

    /// Run every processor in order over an alpha channel
    pub fn process(&self, alpha: &GrayImage) -> Result<GrayImage> {
        let mut current = alpha.clone();
        for processor in &self.processors {
            current = processor.process(&current)?;
        }
        Ok(current)
    }

    /// Convert a binary mask to a 0/255 alpha channel and run the pipeline
    pub fn refine(&self, mask: &Mask) -> Result<GrayImage> {
        self.process(&mask.to_alpha())
    }

    pub fn len(&self) -> usize {
        self.processors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.processors.is_empty()
    }

    /// Get information about the pipeline configuration
    pub fn info(&self) -> String {
        let steps: Vec<String> = self.processors.iter().map(|p| p.name()).collect();
        if steps.is_empty() {
            "AlphaPipeline: identity".to_string()
        } else {
            format!("AlphaPipeline: {}", steps.join(" -> "))
        }
    }
}
