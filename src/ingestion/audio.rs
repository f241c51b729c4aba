//! Audio decode seam: decoded channels become one labeled leaf each.

use crate::error::IngestionResult;
use crate::types::DataContainer;

use super::format::SourceFormat;

/// PCM channels produced by an [`AudioDecoder`].
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedAudio {
    pub sample_rate: u32,
    /// One sample vector per channel.
    pub channels: Vec<Vec<f32>>,
}

/// External audio codec (wav/aif/aiff/ogg/mp3).
pub trait AudioDecoder: Send + Sync {
    fn decode(&self, bytes: &[u8], format: SourceFormat) -> IngestionResult<DecodedAudio>;
}

/// Branch with one leaf per channel, labeled `ch_0`, `ch_1`, …
pub fn channels_to_container(audio: &DecodedAudio) -> DataContainer {
    let leaves = audio
        .channels
        .iter()
        .enumerate()
        .map(|(idx, samples)| {
            let leaf = DataContainer::new();
            leaf.set(samples.as_slice()).with_label(format!("ch_{idx}"));
            leaf
        })
        .collect::<Vec<_>>();
    DataContainer::branch(leaves)
}
