use crate::{
    pipeline::AlphaPipeline,
    traits::AlphaProcessor,
    algorithms::{CloseProcessor, GaussianBlurProcessor, ThresholdProcessor},
};

/// Builder for alpha pipelines with a fluent API
pub struct AlphaPipelineBuilder {
    processors: Vec<Box<dyn AlphaProcessor>>,
}

impl AlphaPipelineBuilder {
    /// Create a new, empty builder
    pub fn new() -> Self {
        Self {
            processors: Vec::new(),
        }
    }

    /// Append a processor to the pipeline
    pub fn add_processor<P>(mut self, processor: P) -> Self
    where
        P: AlphaProcessor + 'static,
    {
        self.processors.push(Box::new(processor));
        self
    }

    /// Append a morphological close over a square of side `extent`
    pub fn with_close(self, extent: u8) -> Self {
        self.add_processor(CloseProcessor { extent })
    }

    /// Append a Gaussian blur
    pub fn with_blur(self, sigma: f32) -> Self {
        self.add_processor(GaussianBlurProcessor { sigma })
    }

    /// Append a binary threshold
    pub fn with_threshold(self, threshold: u8) -> Self {
        self.add_processor(ThresholdProcessor { threshold })
    }

    pub fn build(self) -> AlphaPipeline {
        AlphaPipeline::new(self.processors)
    }

    /// Close, blur, then re-threshold: the shell cutout refinement
    pub fn build_shell(close_extent: u8, sigma: f32, threshold: u8) -> AlphaPipeline {
        Self::new()
            .with_close(close_extent)
            .with_blur(sigma)
            .with_threshold(threshold)
            .build()
    }

    /// Blur then re-threshold, no close: the light pass after trimming
    pub fn build_smoothing(sigma: f32, threshold: u8) -> AlphaPipeline {
        Self::new().with_blur(sigma).with_threshold(threshold).build()
    }
}

impl Default for AlphaPipelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}
