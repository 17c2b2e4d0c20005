//! Diff orchestrator.
//!
//! Runs the full pipeline: size guard → whitespace stripping → element
//! renames → pseudo-paragraph wrapping → structural diff → denormalize.
//! When the structural engine reports an unrepairable stream, the work is
//! discarded and a plain flat alignment over the raw tokens is used
//! instead, routed through the balance repair filter. The size guard
//! coalesces text runs once before giving up with
//! [`Error::SizeExceeded`](crate::error::Error::SizeExceeded).

use tracing::debug;

use crate::align::MatrixAligner;
use crate::coarsen::coalesce_text;
use crate::config::{DiffConfig, WhitespacePolicy};
use crate::engine::BlockDiff;
use crate::error::{Error, Result};
use crate::filter::Balancer;
use crate::normalize::{
    BlockNormalizer, ElementDenormalizer, ElementNormalizer, SequenceProcessor,
    WhitespaceStripper,
};
use crate::op::{Operation, OperationBuffer, OperationSink};
use crate::token::Token;

/// How a diff was produced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiffReport {
    /// Whether the structural pipeline failed and the flat fallback ran.
    pub used_fallback: bool,
    /// Whether text runs were coalesced to fit under the event ceiling.
    pub coarsened: bool,
}

/// The top-level differ.
pub struct Differ {
    config: DiffConfig,
}

impl Differ {
    /// Creates a differ with the default configuration.
    pub fn new() -> Self {
        Differ {
            config: DiffConfig::default(),
        }
    }

    /// Creates a differ with the given configuration.
    pub fn with_config(config: DiffConfig) -> Self {
        Differ { config }
    }

    /// The active configuration.
    pub fn config(&self) -> &DiffConfig {
        &self.config
    }

    /// Diffs two token sequences, emitting operations to `sink`.
    ///
    /// The emitted stream is always balanced. Fails only when the
    /// comparison exceeds the configured event ceiling even after
    /// coalescing text runs.
    pub fn diff(
        &self,
        from: &[Token],
        to: &[Token],
        sink: &mut dyn OperationSink,
    ) -> Result<DiffReport> {
        let mut report = DiffReport::default();
        let mut from = from.to_vec();
        let mut to = to.to_vec();

        // Bound worst-case cost before any quadratic work
        let mut size = from.len() * to.len();
        if size > self.config.max_events {
            debug!(size, limit = self.config.max_events, "coalescing text runs");
            from = coalesce_text(&from);
            to = coalesce_text(&to);
            report.coarsened = true;
            size = from.len() * to.len();
            if size > self.config.max_events {
                return Err(Error::SizeExceeded {
                    size,
                    limit: self.config.max_events,
                });
            }
        }

        let n_from = self.normalize(from.clone());
        let n_to = self.normalize(to.clone());
        debug!(
            from = n_from.len(),
            to = n_to.len(),
            threshold = self.config.similarity_threshold,
            "structural diff"
        );

        let mut engine = BlockDiff::new(&self.config);
        let mut buffer = OperationBuffer::new();
        engine.diff(&n_from, &n_to, &mut buffer);

        if engine.has_error() {
            // Structural result is unusable, rerun flat over the raw tokens
            debug!("unbalanced structural diff, using flat fallback");
            report.used_fallback = true;
            let mut balancer = Balancer::new(&mut *sink);
            balancer.start();
            MatrixAligner.diff(&from, &to, &mut balancer);
            balancer.end();
        } else {
            let mut denormalizer =
                ElementDenormalizer::new(&mut *sink, self.config.rules.clone());
            denormalizer.start();
            buffer.apply_to(&mut denormalizer);
            denormalizer.end();
        }
        Ok(report)
    }

    /// Diffs two token sequences, returning the collected operations.
    pub fn diff_to_operations(
        &self,
        from: &[Token],
        to: &[Token],
    ) -> Result<(Vec<Operation>, DiffReport)> {
        let mut buffer = OperationBuffer::new();
        let report = self.diff(from, to, &mut buffer)?;
        Ok((buffer.into_operations(), report))
    }

    fn normalize(&self, tokens: Vec<Token>) -> Vec<Token> {
        let mut tokens = tokens;
        if self.config.whitespace == WhitespacePolicy::Strip {
            let stripper = WhitespaceStripper::new(
                self.config.whitespace_always.clone(),
                self.config.whitespace_maybe.clone(),
            );
            tokens = stripper.process(tokens);
        }
        for rule in &self.config.rules {
            tokens = ElementNormalizer::new(rule.clone()).process(tokens);
        }
        let wrapper = BlockNormalizer::new(
            &*self.config.para_name,
            self.config.labels.clone(),
            self.config.containers.clone(),
        );
        wrapper.process(tokens)
    }
}

impl Default for Differ {
    fn default() -> Self {
        Differ::new()
    }
}
