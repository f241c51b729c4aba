//! Text passthrough and the raw (unknown format) path.

use crate::error::{IngestionError, IngestionResult};
use crate::types::{DataContainer, Scalar};

/// Wrap UTF-8 `bytes` as a single-scalar leaf labeled `text`.
///
/// Fails with a type mismatch when the content is not valid UTF-8.
pub fn text_container(bytes: Vec<u8>) -> IngestionResult<DataContainer> {
    let text = String::from_utf8(bytes)
        .map_err(|e| IngestionError::type_mismatch(format!("the content is not text: {e}")))?;
    let c = DataContainer::new();
    c.set(text).with_label("text");
    Ok(c)
}

/// Best-effort container for unrecognized formats.
///
/// UTF-8 content becomes a single text scalar; anything else becomes one number per byte. The
/// leaf is labeled `raw`.
pub fn raw_container(bytes: Vec<u8>) -> DataContainer {
    let c = DataContainer::new();
    match String::from_utf8(bytes) {
        Ok(text) => c.set(text),
        Err(e) => c.set(
            e.into_bytes()
                .into_iter()
                .map(|b| Scalar::Number(f64::from(b)))
                .collect::<Vec<_>>(),
        ),
    };
    c.with_label("raw");
    c
}
