//! `datatree-ingest` loads heterogeneous sources into one uniform, in-memory tree of
//! [`types::DataContainer`]s.
//!
//! The primary entrypoint is [`ingestion::Loader`], which picks a parser from the locator's
//! extension (or a forced format), fetches the bytes through a pluggable [`ingestion::Fetcher`]
//! and settles exactly once, through an optional callback *and* the returned future.
//!
//! ## What you can ingest
//!
//! **Sources (auto-detected by extension):**
//!
//! - **CSV**: `.csv`, one labeled leaf per header column
//! - **JSON**: `.json`, `.jsonp` (array-of-records, record, wrapped records, JSONP, NDJSON), transposed into
//!   columns; vendor dialects go through [`ingestion::AdapterRegistry`]
//! - **Text**: `.txt`
//! - **Audio**: `.wav`, `.aif`, `.aiff`, `.ogg`, `.mp3`, decoded by a caller-supplied [`ingestion::AudioDecoder`]
//! - **Images**: `.png`, `.jpg`, `.jpeg`, decoded by a caller-supplied
//!   [`ingestion::ImageDecoder`], then reduced to per-pixel features (see [`processing`])
//! - anything else is delivered raw
//!
//! Live microphone, stream and webcam input is handled by [`capture`], which rewrites a dedicated
//! target container on every frame.
//!
//! ## Quick example: ingest data
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use datatree_ingest::ingestion::{Loader, MemoryFetcher};
//!
//! # fn main() -> Result<(), datatree_ingest::IngestionError> {
//! let fetcher = MemoryFetcher::new().with("people.csv", "name,age\nann,31\nbob,27\n");
//! let loader = Loader::new(Arc::new(fetcher));
//!
//! let table = futures::executor::block_on(loader.load("people.csv", None))?;
//! let age = table.child("age").expect("age column");
//! age.coerce_numeric()?;
//! assert_eq!(age.values().unwrap()[1].as_f64(), Some(27.0));
//! # Ok(())
//! # }
//! ```
//!
//! Callback style works the same way; the callback runs before the future resolves:
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use datatree_ingest::ingestion::{Callback, Loader, MemoryFetcher};
//!
//! let fetcher = MemoryFetcher::new().with("feed.json", r#"[{"t": 1}, {"t": 2}]"#);
//! let loader = Loader::new(Arc::new(fetcher));
//!
//! let done = loader.load(
//!     "feed.json",
//!     Some(Callback::new(|result| {
//!         if let Ok(tree) = result {
//!             println!("{} columns", tree.len());
//!         }
//!     })),
//! );
//! let _ = futures::executor::block_on(done);
//! ```
//!
//! ## Modules
//!
//! - [`ingestion`]: format dispatch, parsers, delivery and observability
//! - [`processing`]: pixel feature extraction
//! - [`capture`]: continuous sample/frame capture into a dedicated container
//! - [`types`]: the data container tree and scalar values
//! - [`error`]: error types shared across the crate

pub mod capture;
pub mod error;
pub mod ingestion;
pub mod processing;
pub mod types;

pub use error::{ErrorKind, IngestionError, IngestionResult};
