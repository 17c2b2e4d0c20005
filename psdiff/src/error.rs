//! Error types for psdiff.

use thiserror::Error;

/// Result type alias for psdiff operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while loading or diffing documents.
#[derive(Error, Debug)]
pub enum Error {
    /// The comparison is too large, even after coalescing text runs.
    #[error("cannot compare contents with more than {limit} events (found {size})")]
    SizeExceeded {
        /// The number of comparisons the diff would require.
        size: usize,
        /// The configured ceiling.
        limit: usize,
    },

    /// XML parsing error.
    #[error("XML parse error: {0}")]
    Parse(String),

    /// XML error from quick-xml.
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
