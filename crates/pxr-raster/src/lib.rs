//! Pixel Robot raster core
//!
//! Everything the robot needs to reason about pixels, independent of how they
//! travel over the wire:
//!
//! - [`PALETTE`]: the 16 colors the drawing service accepts
//! - [`Quantizer`]: memoized nearest-palette-color mapping
//! - [`IndexedImage`]: a raster reduced to one [`ColorIndex`] per cell
//! - [`diff`]: template/snapshot comparison producing a [`MismatchSet`]
//! - [`pick`]: uniform random choice of one mismatched cell as a [`PendingWrite`]
//!
//! # Example
//!
//! ```rust,ignore
//! use pxr_raster::{diff, pick, BoundingBox, Origin, Quantizer, SeededRandom};
//!
//! let quantizer = Quantizer::new();
//! let template = quantizer.index_image(&template_raster, true);
//! let snapshot = quantizer.index_image(&live_raster, false);
//!
//! let mismatch = diff(&template, &snapshot)?;
//! let bounds = BoundingBox::new(Origin::new(100, 40), template.width(), template.height())?;
//! let write = pick(&template, &mismatch, &bounds, &mut SeededRandom::new(7))?;
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod bounds;
mod diff;
mod error;
mod image;
mod palette;
mod pick;
mod quantize;

pub use bounds::{BoundingBox, Origin, SURFACE_SIZE};
pub use diff::{diff, MismatchSet};
pub use error::RasterError;
pub use image::{ImageSource, IndexedImage, Raster};
pub use palette::{ColorIndex, Rgb, Rgba, PALETTE, PALETTE_SIZE};
pub use pick::{pick, PendingWrite, RandomSource, SeededRandom};
pub use quantize::{nearest_palette_index, Quantizer, ALPHA_THRESHOLD};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
