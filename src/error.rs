//! Error types.
//!
//! Dictionary problems are reported line by line as [`Diagnostic`]s and never
//! abort a load. Everything that does abort an operation is a
//! [`TokenizerError`] or, for dialect pack handling, a [`PackError`].

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// A specialized Result type for this crate.
pub type Result<T, E = TokenizerError> = std::result::Result<T, E>;

/// The error type for tokenizer construction, dictionary loading and tokenization.
#[derive(Debug, Error)]
pub enum TokenizerError {
    /// A dictionary file or directory could not be read.
    #[error("I/O error for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A dialect pack could not be resolved, fetched or verified.
    #[error(transparent)]
    Pack(#[from] PackError),

    /// Tokenization was requested but no dictionary was ever loaded and
    /// automatic download is disabled.
    #[error("no dictionary loaded: load a TSV file or enable auto_download")]
    NoDictionary,

    /// The configuration is inconsistent.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A configuration file is not valid JSON.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl TokenizerError {
    pub(crate) fn io<P: Into<PathBuf>>(path: P, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Errors raised while managing dialect packs.
#[derive(Debug, Error)]
pub enum PackError {
    /// The remote source could not be reached.
    #[error("network error: {0}")]
    Network(String),

    /// The remote source did not answer in time.
    #[error("network request timed out")]
    Timeout,

    /// The remote source answered with a non-success status.
    #[error("HTTP error: status {0}")]
    HttpStatus(u16),

    /// The downloaded archive does not hash to the published checksum.
    #[error("checksum mismatch: expected {expected}, got {actual}")]
    ChecksumMismatch { expected: String, actual: String },

    /// The archive is unreadable or does not contain a dialect pack.
    #[error("invalid pack archive: {0}")]
    Archive(String),

    /// Local file-system failure while caching a pack.
    #[error("I/O error for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The source has no pack with this name or version.
    #[error("dialect pack not found: {0}")]
    NotFound(String),

    /// The pack name cannot be used as a cache directory name.
    #[error("invalid dialect pack name: {0:?}")]
    InvalidName(String),

    /// The pack is not cached and the cache has no source to fetch it from.
    #[error("dialect pack {0:?} is not cached and no pack source is configured")]
    NoSource(String),
}

impl PackError {
    pub(crate) fn io<P: Into<PathBuf>>(path: P, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether retrying the same operation later may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            PackError::Network(_) | PackError::Timeout | PackError::HttpStatus(_)
        )
    }
}

impl From<zip::result::ZipError> for PackError {
    fn from(error: zip::result::ZipError) -> Self {
        PackError::Archive(error.to_string())
    }
}

#[cfg(feature = "download")]
impl From<reqwest::Error> for PackError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            PackError::Timeout
        } else if let Some(status) = error.status() {
            PackError::HttpStatus(status.as_u16())
        } else {
            PackError::Network(error.to_string())
        }
    }
}

/// Why a dictionary line was skipped.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DiagnosticKind {
    /// The line has a form but no POS column.
    #[error("missing POS column")]
    MissingPos,

    /// The form column is empty or holds no syllables.
    #[error("empty form")]
    EmptyForm,

    /// The POS column holds a tag outside the tag set.
    #[error("unknown POS tag {0:?}")]
    UnknownPos(String),

    /// The frequency column is not an unsigned integer.
    #[error("invalid frequency {0:?}")]
    InvalidFrequency(String),

    /// The affix column names no known affix rule.
    #[error("unknown affix rule {0:?}")]
    UnknownAffixRule(String),

    /// The line has more columns than the format defines.
    #[error("expected at most 6 columns, found {0}")]
    TooManyColumns(usize),
}

/// A recoverable problem found while loading dictionary data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// File the line came from, or `None` for in-memory data.
    pub source: Option<PathBuf>,
    /// 1-based line number.
    pub line: usize,
    pub kind: DiagnosticKind,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.source {
            Some(path) => write!(f, "{}:{}: {}", path.display(), self.line, self.kind),
            None => write!(f, "<tsv>:{}: {}", self.line, self.kind),
        }
    }
}

impl std::error::Error for Diagnostic {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diagnostic_display() {
        let diag = Diagnostic {
            source: Some(PathBuf::from("words.tsv")),
            line: 3,
            kind: DiagnosticKind::UnknownPos("FOO".to_string()),
        };
        assert_eq!(diag.to_string(), "words.tsv:3: unknown POS tag \"FOO\"");

        let diag = Diagnostic {
            source: None,
            line: 1,
            kind: DiagnosticKind::MissingPos,
        };
        assert_eq!(diag.to_string(), "<tsv>:1: missing POS column");
    }

    #[test]
    fn test_retryable() {
        assert!(PackError::Timeout.is_retryable());
        assert!(PackError::HttpStatus(503).is_retryable());
        assert!(!PackError::NotFound("general".into()).is_retryable());
    }
}
