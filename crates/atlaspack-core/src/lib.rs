//! Core library for packing a directory of images into one or more texture
//! atlas pages plus a sidecar manifest.
//!
//! - Packers: a deterministic uniform-cell grid packer, and a MaxRects
//!   free-rectangle packer with five placement heuristics and a binary-search
//!   page-size driver.
//! - Pipeline: `pack` takes validated `Settings` plus a list of `Rect`s (and
//!   an `ImageSource` to pull pixels from) and returns pages, page images and
//!   a manifest ready to write to disk.
//!
//! Quick example:
//! ```ignore
//! use std::collections::HashSet;
//! use atlaspack_core::prelude::*;
//! # fn main() -> atlaspack_core::error::Result<()> {
//! let settings = Settings::default();
//! let existing = HashSet::new();
//! let options = PackOptions {
//!     atlas_name: "atlas",
//!     existing_manifest: None,
//!     existing_page_names: &existing,
//!     appending: false,
//! };
//! # struct Src;
//! # impl ImageSource for Src { fn load(&self, _: &str) -> Result<image::RgbaImage> { unimplemented!() } }
//! let out = pack(vec![], &settings, &Src, &NoopBleed, &mut NoopProgress, &options)?;
//! println!("pages: {}", out.pages.len());
//! # Ok(()) }
//! ```

pub mod assembler;
pub mod compositing;
pub mod config;
pub mod error;
pub mod manifest;
pub mod model;
pub mod packer;
pub mod pipeline;
pub mod progress;
pub mod search;

pub use config::Settings;
pub use error::{PackError, Result};
pub use model::{Alias, NinePatch, Page, Rect};
pub use pipeline::{pack, PackOptions, PackResult};
pub use progress::{NoopProgress, ProgressSink};

/// Convenience prelude for common types and functions.
pub mod prelude {
    pub use crate::assembler::{BleedPostProcess, ImageSource, NoopBleed};
    pub use crate::config::{OutputFormat, ResamplingFilter, Settings};
    pub use crate::error::{PackError, Result};
    pub use crate::model::{Alias, NinePatch, Page, Rect};
    pub use crate::packer::maxrects::MaxRectsHeuristic;
    pub use crate::pipeline::{pack, PackOptions, PackResult};
    pub use crate::progress::{NoopProgress, ProgressSink};
}
