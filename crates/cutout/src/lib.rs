//! # Device Cutout Library
//!
//! Turns a product photo of a device on a uniform backdrop into a clean RGBA
//! cutout. Everything works on in-memory `image` buffers; loading and saving
//! files is left to the caller.
//!
//! ## Stages
//!
//! - **Shell extraction**: estimate the backdrop color from the border, flood
//!   it in from the edges, keep the largest remaining blob and smooth its edge
//! - **Screen punch**: find the green screen area in the original photo and
//!   cut a rounded hole for it in the cutout
//! - **Stand removal**: trim the stand under the device body with a cut-line
//!   rule and drop leftover fragments
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use cutout::{ShellExtractor, ScreenPuncher};
//!
//! let photo = image::open("device.jpg")?.to_rgba8();
//! let shell = ShellExtractor::default().extract(&photo)?;
//! println!("background {} tolerance {}", shell.background, shell.tolerance);
//!
//! let punched = ScreenPuncher::default().punch(&photo, &shell.image)?;
//! punched.image.save("device-cutout.png")?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Custom Refinement
//!
//! ```rust,no_run
//! use cutout::{AlphaPipeline, Mask};
//!
//! let pipeline = AlphaPipeline::builder()
//!     .with_close(5)
//!     .with_blur(1.5)
//!     .with_threshold(128)
//!     .build();
//! let alpha = pipeline.refine(&Mask::new(64, 64))?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod error;
pub mod types;
pub mod traits;
pub mod algorithms;
pub mod pipeline;
pub mod stages;
pub mod manager;

pub use error::{CutoutError, Result};
pub use types::{BoundingBox, Color, CropOffset, Mask};
pub use traits::*;
pub use algorithms::*;
pub use pipeline::{AlphaPipeline, builder::AlphaPipelineBuilder};
pub use stages::*;
pub use manager::{CutoutManager, StageCommand, StageReport};
