//! Image decode seam: decoded pixels go through the pixel feature extractor.

use crate::error::IngestionResult;
use crate::processing::pixels::PixelBuffer;

use super::format::SourceFormat;

/// External image decoder/rasterizer (png/jpg/jpeg).
///
/// Implementations return an RGBA buffer built with [`PixelBuffer::new`], which already rejects
/// zero-sized or truncated images.
pub trait ImageDecoder: Send + Sync {
    fn decode(&self, bytes: &[u8], format: SourceFormat) -> IngestionResult<PixelBuffer>;
}
