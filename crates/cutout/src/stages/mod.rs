//! The three cutout stages. Each takes its input buffers explicitly and
//! returns freshly allocated output.

pub mod shell;
pub mod punch;
pub mod stand;

pub use shell::{ShellConfig, ShellCutout, ShellExtractor, alpha_channel, apply_alpha, padded_crop};
pub use punch::{PunchConfig, PunchedCutout, ScreenPuncher};
pub use stand::{Extent, ResolvedStandRule, StandConfig, StandRemover, StandRule, TrimmedCutout};
