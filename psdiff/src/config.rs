//! Diff configuration.
//!
//! All knobs are optional with defaults matching the PSML vocabulary this
//! engine was built for. The configuration is read-only for the duration of
//! one diff; it is passed by reference into the pipeline and never mutated.

use rustc_hash::FxHashSet;

/// Granularity at which the loader splits character data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextGranularity {
    /// One token per text node.
    Text,
    /// Alternating word and whitespace runs.
    #[default]
    Word,
    /// One token per character.
    Character,
}

/// How whitespace-only text tokens are treated before diffing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WhitespacePolicy {
    /// Keep whitespace tokens as they are.
    #[default]
    Preserve,
    /// Strip ignorable whitespace using the two-tier element policy.
    Strip,
}

/// A reversible cosmetic element rename applied before diffing.
///
/// The `source` element is replaced by the `target` element, flagged with a
/// `source="true"` attribute so the denormalizer can restore it afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizeRule {
    /// Name of the element to rewrite (e.g. "hcell").
    pub source: String,
    /// Name of the structurally equivalent common element (e.g. "cell").
    pub target: String,
}

impl NormalizeRule {
    /// Creates a rename rule.
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        NormalizeRule {
            source: source.into(),
            target: target.into(),
        }
    }
}

fn name_set(names: &[&str]) -> FxHashSet<String> {
    names.iter().map(|n| (*n).to_string()).collect()
}

/// Configuration for a [`Differ`](crate::differ::Differ).
#[derive(Debug, Clone)]
pub struct DiffConfig {
    /// Minimum similarity score at which two folded blocks are accepted as
    /// a match rather than a delete/insert pair.
    pub similarity_threshold: f32,

    /// Element names eligible for folding into composite units.
    pub blocks: FxHashSet<String>,

    /// Maximum number of comparisons before the engine coalesces text runs,
    /// and the hard ceiling after coalescing.
    pub max_events: usize,

    /// Cosmetic element renames applied before diffing and undone after.
    pub rules: Vec<NormalizeRule>,

    /// Whitespace handling before diffing.
    pub whitespace: WhitespacePolicy,

    /// Name used for the pseudo paragraphs wrapping bare text.
    pub para_name: String,

    /// Elements whose bare text children are wrapped in pseudo paragraphs.
    pub labels: FxHashSet<String>,

    /// Elements that establish structural boundaries for the
    /// paragraph-wrapping normalizer.
    pub containers: FxHashSet<String>,

    /// Elements whose whitespace-only text children are always dropped
    /// when stripping.
    pub whitespace_always: FxHashSet<String>,

    /// Elements whose whitespace-only text children are dropped only when
    /// other content remains.
    pub whitespace_maybe: FxHashSet<String>,
}

impl DiffConfig {
    /// Default similarity threshold.
    pub const DEFAULT_SIMILARITY_THRESHOLD: f32 = 0.5;

    /// Default comparison-count ceiling.
    pub const DEFAULT_MAX_EVENTS: usize = 4_000_000;
}

impl Default for DiffConfig {
    fn default() -> Self {
        DiffConfig {
            similarity_threshold: Self::DEFAULT_SIMILARITY_THRESHOLD,
            blocks: name_set(&["heading", "item", "para", "preformat", "row"]),
            max_events: Self::DEFAULT_MAX_EVENTS,
            rules: vec![
                NormalizeRule::new("hcell", "cell"),
                NormalizeRule::new("nlist", "list"),
            ],
            whitespace: WhitespacePolicy::default(),
            para_name: "para".to_string(),
            labels: name_set(&["block"]),
            containers: name_set(&[
                "para", "list", "nlist", "block", "heading", "table", "preformat",
            ]),
            whitespace_always: name_set(&["row", "list", "nlist", "table", "fragment"]),
            whitespace_maybe: name_set(&["cell", "item", "para", "block", "blockxref", "hcell"]),
        }
    }
}
