//! Pixel feature extraction.
//!
//! The processing layer turns decoded RGBA frames ([`PixelBuffer`]) into per-pixel feature leaves
//! inside a [`crate::types::DataContainer`]:
//!
//! - [`FeatureMode::Brightness`]: perceived luminance in `[0, 1]`
//! - [`FeatureMode::Hue`]: HSV hue in degrees, `[0, 360)`, `0` for grey pixels
//! - [`FeatureMode::Heatmap`]: hue band mapped to `[0, 1]`, `0` for near-black pixels
//! - [`FeatureMode::Rgb`]: a branch of `red`/`green`/`blue` leaves scaled to `[0, 1]`
//!
//! Every produced leaf carries `block_width` = frame width so consumers can recover rows.
//!
//! ```rust
//! use datatree_ingest::processing::{extract_features, FeatureMode, PixelBuffer};
//!
//! # fn main() -> Result<(), datatree_ingest::IngestionError> {
//! let frame = PixelBuffer::new(2, 1, vec![255, 255, 255, 255, 0, 0, 0, 255])?;
//! let out = extract_features(&frame, FeatureMode::Brightness);
//! assert_eq!(out.block_width(), Some(2));
//! assert_eq!(out.len(), 2);
//! # Ok(())
//! # }
//! ```

pub mod pixels;

pub use pixels::{extract_features, extract_into, FeatureMode, PixelBuffer};
