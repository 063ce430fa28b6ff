//! Rich error types for the wikitext module.
//!
//! This module centralizes all error kinds used by the wikitext parser and the
//! tree/query helpers built on top of it. Parse errors carry the 1-based line
//! number and the unconsumed remainder of that line, so a failure can be located
//! in the source without re-running with extra logging.
//!
//! Exported items:
//! - `WtError` - main error enum with variants for parse failures, missing
//!    items, index issues, invalid arguments and configuration loading.
//! - `Result<T>` - convenient alias `std::result::Result<T, WtError>`.

use std::error::Error;
use std::fmt;

/// The canonical result type used across the wikitext module.
pub type Result<T> = std::result::Result<T, WtError>;

/// Wikitext error with rich variants.
///
/// - `ParseError` - a bounded construct (template, wikilink, table, raw tag)
///    ran off the end of input before its terminator was found.
/// - `NotFound` - requested item was not present (template field, var).
/// - `IndexOutOfBounds` - asked for the Nth element but the collection was
///    smaller; contains both the requested index and the available length.
/// - `InvalidArgument` - e.g. asking for a template field of a non-template node.
/// - `Io` - wrapper for underlying I/O errors (reading input or siteinfo files).
/// - `Json` - a siteinfo document could not be decoded.
/// - `Other` - catch-all carrying a message and optional boxed cause.
#[derive(Debug)]
pub enum WtError {
    ParseError {
        msg: String,
        /// 1-based line where the problem was detected.
        line: usize,
        /// Unconsumed text of that line.
        rest: String,
    },
    NotFound {
        msg: String,
    },
    IndexOutOfBounds {
        idx: usize,
        len: usize,
    },
    InvalidArgument {
        msg: String,
    },
    Io {
        msg: String,
        source: Option<Box<dyn Error + Send + Sync + 'static>>,
    },
    Json {
        msg: String,
        source: serde_json::Error,
    },
    Other {
        msg: String,
        source: Option<Box<dyn Error + Send + Sync + 'static>>,
    },
}

impl WtError {
    /// Construct a parse error at `line` with the remaining text of that line.
    pub fn parse_at<S: Into<String>, R: Into<String>>(msg: S, line: usize, rest: R) -> Self {
        WtError::ParseError {
            msg: msg.into(),
            line,
            rest: rest.into(),
        }
    }

    /// Construct a not-found error.
    pub fn not_found<S: Into<String>>(msg: S) -> Self {
        WtError::NotFound { msg: msg.into() }
    }

    /// Construct an index-out-of-bounds error.
    pub fn index_oob(idx: usize, len: usize) -> Self {
        WtError::IndexOutOfBounds { idx, len }
    }

    /// Construct an invalid argument error.
    pub fn invalid_arg<S: Into<String>>(msg: S) -> Self {
        WtError::InvalidArgument { msg: msg.into() }
    }

    /// Wrap a std::io::Error or other error as an Io variant.
    pub fn io_err<E: Error + Send + Sync + 'static>(msg: impl Into<String>, e: E) -> Self {
        WtError::Io {
            msg: msg.into(),
            source: Some(Box::new(e)),
        }
    }

    /// Generic helper to produce Other(...) with an optional source.
    pub fn other_with_source<E: Error + Send + Sync + 'static>(
        msg: impl Into<String>,
        source: Option<E>,
    ) -> Self {
        WtError::Other {
            msg: msg.into(),
            source: source.map(|e| Box::new(e) as Box<dyn Error + Send + Sync>),
        }
    }

    /// Returns a short, user-friendly description of the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            WtError::ParseError { .. } => "ParseError",
            WtError::NotFound { .. } => "NotFound",
            WtError::IndexOutOfBounds { .. } => "IndexOutOfBounds",
            WtError::InvalidArgument { .. } => "InvalidArgument",
            WtError::Io { .. } => "Io",
            WtError::Json { .. } => "Json",
            WtError::Other { .. } => "Other",
        }
    }

    /// True for hard parse failures.
    pub fn is_parse_error(&self) -> bool {
        matches!(self, WtError::ParseError { .. })
    }

    /// Line number of a parse error.
    pub fn line(&self) -> Option<usize> {
        match self {
            WtError::ParseError { line, .. } => Some(*line),
            _ => None,
        }
    }

    /// If the error has an underlying source, return it (if any).
    pub fn source_opt(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            WtError::Io { source, .. } | WtError::Other { source, .. } => {
                source.as_ref().map(|b| b.as_ref() as &dyn Error)
            }
            WtError::Json { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl fmt::Display for WtError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WtError::ParseError { msg, line, rest } => {
                if rest.is_empty() {
                    write!(f, "Parse error at line {}: {}", line, msg)
                } else {
                    write!(f, "Parse error at line {}: {} (near {:?})", line, msg, rest)
                }
            }
            WtError::NotFound { msg } => write!(f, "Not found: {}", msg),
            WtError::IndexOutOfBounds { idx, len } => {
                write!(f, "Index out of bounds: requested {}, length {}", idx, len)
            }
            WtError::InvalidArgument { msg } => write!(f, "Invalid argument: {}", msg),
            WtError::Io { msg, source } => {
                if let Some(s) = source {
                    write!(f, "IO error: {} (cause: {})", msg, s)
                } else {
                    write!(f, "IO error: {}", msg)
                }
            }
            WtError::Json { msg, source } => write!(f, "JSON error: {} (cause: {})", msg, source),
            WtError::Other { msg, source } => {
                if let Some(s) = source {
                    write!(f, "{} (cause: {})", msg, s)
                } else {
                    write!(f, "{}", msg)
                }
            }
        }
    }
}

impl Error for WtError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.source_opt()
    }
}

/* Common conversions to make error propagation ergonomic. */

impl From<std::io::Error> for WtError {
    fn from(e: std::io::Error) -> Self {
        WtError::io_err("I/O error", e)
    }
}

impl From<serde_json::Error> for WtError {
    fn from(e: serde_json::Error) -> Self {
        WtError::Json {
            msg: "invalid siteinfo document".into(),
            source: e,
        }
    }
}

impl From<regex::Error> for WtError {
    fn from(e: regex::Error) -> Self {
        WtError::other_with_source("invalid pattern", Some(e))
    }
}
