//! Format detection and dispatch.
//!
//! A [`SourceDescriptor`] pairs a remote locator or a [`LocalSource`] with a [`SourceFormat`].
//! Each format maps to exactly one [`IngestionPath`]. Unknown formats take the raw path; they are
//! never an error.

use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use super::source::LocalSource;

/// Format tag derived from a file extension (or forced by the caller).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceFormat {
    Csv,
    Json,
    Jsonp,
    Text,
    Wav,
    Aif,
    Aiff,
    Ogg,
    Mp3,
    Png,
    Jpg,
    Jpeg,
    Unknown,
}

/// The parser/extractor a source is routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IngestionPath {
    /// CSV → one labeled leaf per column.
    Csv,
    /// JSON/JSONP → dialect adapters or generic record transposition.
    Json,
    /// Text passthrough into a single-scalar leaf.
    Text,
    /// External audio decode → one leaf per channel.
    Audio,
    /// External image decode → pixel feature extraction.
    Image,
    /// No structural parsing.
    Raw,
}

impl SourceFormat {
    /// Map an extension to a format. Matching is case-sensitive.
    pub fn from_extension(ext: &str) -> Self {
        match ext {
            "csv" => Self::Csv,
            "json" => Self::Json,
            "jsonp" => Self::Jsonp,
            "txt" => Self::Text,
            "wav" => Self::Wav,
            "aif" => Self::Aif,
            "aiff" => Self::Aiff,
            "ogg" => Self::Ogg,
            "mp3" => Self::Mp3,
            "png" => Self::Png,
            "jpg" => Self::Jpg,
            "jpeg" => Self::Jpeg,
            _ => Self::Unknown,
        }
    }

    /// Classify a locator by the text after its final `.`.
    pub fn from_locator(locator: &str) -> Self {
        locator
            .rsplit_once('.')
            .map_or(Self::Unknown, |(_, ext)| Self::from_extension(ext))
    }

    /// Classify a local file name.
    ///
    /// Only JSON and CSV are recognized locally: the name must contain `.json` / `.csv` after at
    /// least one character (case-insensitive). Everything else is [`SourceFormat::Unknown`].
    pub fn from_local_name(name: &str) -> Self {
        let lower = name.to_ascii_lowercase();
        let has = |needle: &str| lower.get(1..).is_some_and(|rest| rest.contains(needle));
        if has(".json") {
            Self::Json
        } else if has(".csv") {
            Self::Csv
        } else {
            Self::Unknown
        }
    }

    pub fn path(&self) -> IngestionPath {
        match self {
            Self::Csv => IngestionPath::Csv,
            Self::Json | Self::Jsonp => IngestionPath::Json,
            Self::Text => IngestionPath::Text,
            Self::Wav | Self::Aif | Self::Aiff | Self::Ogg | Self::Mp3 => IngestionPath::Audio,
            Self::Png | Self::Jpg | Self::Jpeg => IngestionPath::Image,
            Self::Unknown => IngestionPath::Raw,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Json => "json",
            Self::Jsonp => "jsonp",
            Self::Text => "txt",
            Self::Wav => "wav",
            Self::Aif => "aif",
            Self::Aiff => "aiff",
            Self::Ogg => "ogg",
            Self::Mp3 => "mp3",
            Self::Png => "png",
            Self::Jpg => "jpg",
            Self::Jpeg => "jpeg",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for SourceFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceFormat {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from_extension(s))
    }
}

/// Where the bytes come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    /// Fetched through the configured [`super::Fetcher`].
    Remote(String),
    /// Already in memory.
    Local(LocalSource),
}

/// A classified source, ready for dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDescriptor {
    pub source: Source,
    pub format: SourceFormat,
}

impl SourceDescriptor {
    /// Describe a remote locator, classified by extension.
    pub fn remote(locator: impl Into<String>) -> Self {
        let locator = locator.into();
        let format = SourceFormat::from_locator(&locator);
        Self {
            source: Source::Remote(locator),
            format,
        }
    }

    /// Describe a local source, classified by its name.
    pub fn local(source: LocalSource) -> Self {
        let format = SourceFormat::from_local_name(&source.name);
        Self {
            source: Source::Local(source),
            format,
        }
    }

    /// Replace the detected format when `format` is `Some`.
    pub fn with_format(mut self, format: Option<SourceFormat>) -> Self {
        if let Some(f) = format {
            self.format = f;
        }
        self
    }

    /// Locator (remote) or file name (local).
    pub fn locator(&self) -> &str {
        match &self.source {
            Source::Remote(l) => l,
            Source::Local(l) => &l.name,
        }
    }

    pub fn path(&self) -> IngestionPath {
        self.format.path()
    }
}
