//! psdiff - Block-aware structural XML diff
//!
//! This library computes a structural, human-readable difference between
//! two versions of an XML-like document and emits an annotated operation
//! stream (insert / delete / match) that renders back into well-formed
//! markup highlighting the changes.
//!
//! # Overview
//!
//! The engine groups recognized block-level subtrees into atomic composite
//! units, aligns the two coarse sequences with a similarity-scored
//! alignment rather than pure equality, and recursively decides per
//! matched pair whether to diff the contents flat or to re-segment them by
//! block boundaries. Streaming filters repair the nesting of the emitted
//! stream and relocate matches for a calmer-looking diff; a bounded flat
//! fallback guarantees the diff either completes or fails predictably.
//!
//! # Example
//!
//! ```
//! use psdiff::{load_str, Differ};
//!
//! let from = load_str("<para>Hello world</para>")?;
//! let to = load_str("<para>Hello there</para>")?;
//!
//! let differ = Differ::new();
//! let (operations, _report) = differ.diff_to_operations(&from, &to)?;
//! assert_eq!(operations.len(), 5);
//! # Ok::<(), psdiff::Error>(())
//! ```

pub mod align;
pub mod coarsen;
pub mod config;
pub mod differ;
pub mod engine;
pub mod error;
pub mod filter;
pub mod fold;
pub mod format;
pub mod load;
pub mod normalize;
pub mod op;
pub mod similarity;
pub mod token;

// Re-export commonly used types
pub use config::{DiffConfig, NormalizeRule, TextGranularity, WhitespacePolicy};
pub use differ::{DiffReport, Differ};
pub use engine::BlockDiff;
pub use error::{Error, Result};
pub use format::XmlDiffOutput;
pub use load::{load_str, XmlLoader};
pub use op::{Operation, OperationBuffer, OperationSink, Operator};
pub use token::{Attribute, Element, EndTag, StartTag, TextToken, Token};
