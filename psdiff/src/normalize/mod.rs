//! Reversible pre-diff rewrites.
//!
//! Normalization makes superficially different markup comparable: rare
//! elements are renamed to their common structural equivalent (tagged with
//! a flag attribute so the rename can be undone), bare text directly under
//! a label element is wrapped in pseudo paragraphs, and ignorable
//! whitespace is stripped. The [`ElementDenormalizer`] restores renamed
//! elements on the way out, using the emitted operations to decide which
//! name belongs in the output.

mod block;
mod rename;
mod whitespace;

pub use block::BlockNormalizer;
pub use rename::{ElementDenormalizer, ElementNormalizer};
pub use whitespace::WhitespaceStripper;

use crate::token::Token;

/// A pass that rewrites a whole token sequence before diffing.
pub trait SequenceProcessor {
    /// Returns the processed sequence.
    fn process(&self, tokens: Vec<Token>) -> Vec<Token>;
}
