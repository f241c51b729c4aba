//! Ingestion entrypoints and implementations.
//!
//! Most callers should use [`Loader`] (from [`unified`]) which:
//!
//! - detects the format from the locator extension (see [`format`])
//! - fetches bytes through a [`Fetcher`] and builds a [`crate::types::DataContainer`]
//! - settles through an optional [`Callback`] and the returned future (see [`delivery`])
//! - optionally reports success/failure/alerts to an [`IngestionObserver`]
//!
//! Format-specific functions are also available under:
//! - [`csv`]
//! - [`json`] and [`adapters`]
//! - [`text`]
//! - [`audio`] / [`image`] (decoder seams)

pub mod adapters;
pub mod audio;
pub mod csv;
pub mod delivery;
pub mod format;
pub mod image;
pub mod json;
pub mod observability;
pub mod source;
pub mod text;
pub mod unified;

pub use adapters::{AdapterRegistry, DialectAdapter, JsonpEnvelopeAdapter, WeatherServiceAdapter};
pub use audio::{AudioDecoder, DecodedAudio};
pub use self::csv::CsvOptions;
pub use delivery::{Callback, Completion, Deferred};
pub use format::{IngestionPath, Source, SourceDescriptor, SourceFormat};
pub use image::ImageDecoder;
pub use observability::{
    CompositeObserver, IngestionContext, IngestionObserver, IngestionSeverity, IngestionStats, TracingObserver,
};
pub use source::{Fetcher, FileFetcher, LocalSource, MemoryFetcher};
pub use unified::{Loader, LoaderOptions};
