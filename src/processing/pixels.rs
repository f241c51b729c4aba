//! Per-pixel feature extraction from interleaved RGBA buffers.
//!
//! Every mode produces one scalar per pixel and sets `block_width` to the image width, so
//! [`DataContainer::rows`] yields image rows. Values are computed in `f64` and stored at `f32`
//! precision.

use std::fmt;
use std::str::FromStr;

use rayon::prelude::*;

use crate::error::{IngestionError, IngestionResult};
use crate::types::{DataContainer, Scalar};

const BRIGHTNESS_WEIGHTS: [f64; 3] = [0.34, 0.5, 0.16];

/// Below this `R+G+B` sum (channels in `[0,1]`) a pixel is treated as black by the heatmap.
const HEATMAP_DARK_SUM: f64 = 0.15;
const HEATMAP_BAND: f64 = 300.0;

/// An interleaved RGBA pixel buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    width: usize,
    height: usize,
    rgba: Vec<u8>,
}

impl PixelBuffer {
    /// Wrap a decoded RGBA buffer.
    ///
    /// Fails with a decode error for zero dimensions or when `rgba.len() != width * height * 4`.
    pub fn new(width: usize, height: usize, rgba: Vec<u8>) -> IngestionResult<Self> {
        if width == 0 || height == 0 {
            return Err(IngestionError::decode(format!(
                "pixel buffer has zero dimension ({width}x{height})"
            )));
        }
        let expected = width
            .checked_mul(height)
            .and_then(|n| n.checked_mul(4))
            .ok_or_else(|| IngestionError::decode(format!("pixel buffer too large ({width}x{height})")))?;
        if rgba.len() != expected {
            return Err(IngestionError::decode(format!(
                "pixel buffer length {} does not match {width}x{height} RGBA ({expected} bytes)",
                rgba.len()
            )));
        }
        Ok(Self { width, height, rgba })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Raw interleaved RGBA bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.rgba
    }

    fn per_pixel(&self, f: impl Fn(&[u8]) -> f64 + Sync + Send) -> Vec<Scalar> {
        self.rgba
            .par_chunks_exact(4)
            .map(|px| Scalar::Number(f64::from(f(px) as f32)))
            .collect()
    }
}

/// Which feature to derive from each pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FeatureMode {
    /// Weighted brightness in `[0,1]`.
    #[default]
    Brightness,
    /// HSV hue in degrees, `[0,360)`.
    Hue,
    /// Hue band mapped to `[0,1]` (red hot, blue/black cold).
    Heatmap,
    /// Normalized red, green and blue channels as three labeled leaves.
    Rgb,
}

impl FeatureMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Brightness => "brightness",
            Self::Hue => "hue",
            Self::Heatmap => "heatmap",
            Self::Rgb => "rgb",
        }
    }
}

impl fmt::Display for FeatureMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FeatureMode {
    type Err = IngestionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "brightness" => Ok(Self::Brightness),
            "hue" => Ok(Self::Hue),
            "heatmap" => Ok(Self::Heatmap),
            "rgb" => Ok(Self::Rgb),
            other => Err(IngestionError::type_mismatch(format!(
                "unknown image mode '{other}' (expected brightness, hue, heatmap or rgb)"
            ))),
        }
    }
}

/// Derive per-pixel features from `pixels`.
///
/// `Brightness`, `Hue` and `Heatmap` return a single leaf labeled after the mode. `Rgb` returns a
/// branch labeled `rgb` with `red`, `green` and `blue` leaves. Every leaf has
/// `block_width == pixels.width()`.
pub fn extract_features(pixels: &PixelBuffer, mode: FeatureMode) -> DataContainer {
    let out = DataContainer::new();
    extract_into(&out, pixels, mode);
    out
}

/// Like [`extract_features`], but overwrites `target` in place.
pub fn extract_into(target: &DataContainer, pixels: &PixelBuffer, mode: FeatureMode) {
    let values = match mode {
        FeatureMode::Brightness => pixels.per_pixel(brightness),
        FeatureMode::Hue => pixels.per_pixel(hue),
        FeatureMode::Heatmap => pixels.per_pixel(heatmap),
        FeatureMode::Rgb => {
            let channels = ["red", "green", "blue"]
                .into_iter()
                .enumerate()
                .map(|(idx, label)| {
                    let leaf = DataContainer::new();
                    leaf.set(pixels.per_pixel(|px| f64::from(px[idx]) / 255.0))
                        .with_label(label)
                        .with_block_width(pixels.width);
                    leaf
                })
                .collect::<Vec<_>>();
            target.set(channels).with_label(mode.as_str());
            return;
        }
    };
    target
        .set(values)
        .with_block_width(pixels.width)
        .with_label(mode.as_str());
}

/// `(0.34 R + 0.5 G + 0.16 B) / 255` for one RGBA pixel.
pub fn brightness(px: &[u8]) -> f64 {
    let sum = BRIGHTNESS_WEIGHTS[0] * f64::from(px[0])
        + BRIGHTNESS_WEIGHTS[1] * f64::from(px[1])
        + BRIGHTNESS_WEIGHTS[2] * f64::from(px[2]);
    sum / 255.0
}

/// Hue before wrapping into `[0,360)`; achromatic pixels give `0`.
fn raw_hue(r: f64, g: f64, b: f64) -> f64 {
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = max - min;
    if delta == 0.0 {
        return 0.0;
    }

    let h = if max == r {
        (g - b) / delta
    } else if max == g {
        2.0 + (b - r) / delta
    } else {
        4.0 + (r - g) / delta
    };
    h * 60.0
}

fn normalized(px: &[u8]) -> (f64, f64, f64) {
    (
        f64::from(px[0]) / 255.0,
        f64::from(px[1]) / 255.0,
        f64::from(px[2]) / 255.0,
    )
}

/// HSV hue in degrees for one RGBA pixel.
pub fn hue(px: &[u8]) -> f64 {
    let (r, g, b) = normalized(px);
    let h = raw_hue(r, g, b);
    if h < 0.0 { h + 360.0 } else { h }
}

/// Heatmap intensity in `[0,1]` for one RGBA pixel.
pub fn heatmap(px: &[u8]) -> f64 {
    let (r, g, b) = normalized(px);
    let mut h = raw_hue(r, g, b);

    if h < -30.0 {
        h += 360.0;
    }
    if h < 0.0 {
        h = 0.0;
    }
    if h > HEATMAP_BAND {
        h = HEATMAP_BAND;
    }
    if r + g + b < HEATMAP_DARK_SUM {
        h = HEATMAP_BAND;
    }
    if h.is_nan() {
        h = 0.0;
    }
    1.0 - h / HEATMAP_BAND
}
