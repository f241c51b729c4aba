use std::fmt;

use thiserror::Error;

/// Convenience result type for ingestion operations.
pub type IngestionResult<T> = Result<T, IngestionError>;

/// Error type returned by every ingestion entry point.
///
/// This is a single error enum shared across CSV/JSON/text/image/audio ingestion and live capture.
/// Use [`IngestionError::kind`] when you only care about the failure category.
#[derive(Debug, Error)]
pub enum IngestionError {
    /// Underlying I/O error (e.g. file not found, permission denied).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// The transport collaborator could not supply bytes for a locator.
    #[error("transport error for '{locator}': {message}")]
    Transport { locator: String, message: String },

    /// Malformed CSV.
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    /// Malformed JSON, or JSON without a recognizable record shape.
    #[error("json error: {message}")]
    Json { message: String },

    /// A payload or argument had the wrong type (e.g. text ingestion receiving binary data).
    #[error("type mismatch: {message}")]
    TypeMismatch { message: String },

    /// A decoder or capture device needed by the operation is not available.
    #[error("capability unavailable: {capability}")]
    UnavailableCapability { capability: String },

    /// An external decoder rejected its input, or a decoded buffer is unusable.
    #[error("decode error: {message}")]
    Decode { message: String },
}

/// Failure category of an [`IngestionError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed CSV/JSON.
    Format,
    /// Wrong payload or argument type.
    TypeMismatch,
    /// Missing decoder or capture support.
    UnavailableCapability,
    /// Audio/image decode failure or invalid pixel buffer.
    Decode,
    /// Transport or file-system failure.
    Io,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Format => "format",
            Self::TypeMismatch => "type_mismatch",
            Self::UnavailableCapability => "unavailable_capability",
            Self::Decode => "decode",
            Self::Io => "io",
        };
        f.write_str(s)
    }
}

impl IngestionError {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Io(_) | Self::Transport { .. } => ErrorKind::Io,
            Self::Csv(err) => match err.kind() {
                csv::ErrorKind::Io(_) => ErrorKind::Io,
                _ => ErrorKind::Format,
            },
            Self::Json { .. } => ErrorKind::Format,
            Self::TypeMismatch { .. } => ErrorKind::TypeMismatch,
            Self::UnavailableCapability { .. } => ErrorKind::UnavailableCapability,
            Self::Decode { .. } => ErrorKind::Decode,
        }
    }

    pub(crate) fn json(message: impl Into<String>) -> Self {
        Self::Json {
            message: message.into(),
        }
    }

    pub(crate) fn type_mismatch(message: impl Into<String>) -> Self {
        Self::TypeMismatch {
            message: message.into(),
        }
    }

    pub(crate) fn unavailable(capability: impl Into<String>) -> Self {
        Self::UnavailableCapability {
            capability: capability.into(),
        }
    }

    pub(crate) fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ErrorKind, IngestionError};

    #[test]
    fn kinds_cover_the_taxonomy() {
        assert_eq!(IngestionError::json("bad").kind(), ErrorKind::Format);
        assert_eq!(IngestionError::type_mismatch("bin").kind(), ErrorKind::TypeMismatch);
        assert_eq!(IngestionError::unavailable("mic").kind(), ErrorKind::UnavailableCapability);
        assert_eq!(IngestionError::decode("png").kind(), ErrorKind::Decode);

        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        assert_eq!(IngestionError::from(io).kind(), ErrorKind::Io);
    }

    #[test]
    fn display_includes_context() {
        let err = IngestionError::Transport {
            locator: "http://host/a.csv".to_string(),
            message: "status 404".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("http://host/a.csv"));
        assert!(msg.contains("404"));
        assert_eq!(ErrorKind::UnavailableCapability.to_string(), "unavailable_capability");
    }
}
