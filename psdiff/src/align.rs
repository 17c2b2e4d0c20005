//! Sequence alignment.
//!
//! Two aligners share one dynamic-programming core:
//!
//! - [`SimilarityAligner`] accepts a pair as a match when its similarity
//!   score clears a threshold, so two folded blocks with the same tag but
//!   partially different contents can still align (the detailed diff is
//!   deferred to the recursive differ).
//! - [`MatrixAligner`] is the plain equality-based variant used for flat
//!   child diffs and for the bounded fallback.

use crate::op::{OperationSink, Operator};
use crate::similarity::{Similarity, TokenEquality};
use crate::token::Token;

const UNREACHABLE: u32 = u32::MAX / 2;

/// Wagner–Fischer alignment with a pluggable similarity function.
pub struct SimilarityAligner<'a, F: Similarity + ?Sized> {
    similarity: &'a F,
    threshold: f32,
}

impl<'a, F: Similarity + ?Sized> SimilarityAligner<'a, F> {
    /// Creates an aligner with the given similarity function and
    /// match-acceptance threshold.
    pub fn new(similarity: &'a F, threshold: f32) -> Self {
        SimilarityAligner {
            similarity,
            threshold,
        }
    }

    /// Aligns `from` with `to`, emitting the minimal-cost edit script.
    ///
    /// A matched pair emits the `from` side token. On equal cost the
    /// backtrack prefers matches, then deletions before insertions.
    pub fn align(&self, from: &[Token], to: &[Token], sink: &mut dyn OperationSink) {
        let m = from.len();
        let n = to.len();

        // Score every pair once; backtracking reuses the decisions.
        let mut similar = vec![false; m * n];
        for i in 0..m {
            for j in 0..n {
                similar[i * n + j] = self.similarity.score(&from[i], &to[j]) >= self.threshold;
            }
        }

        let width = n + 1;
        let mut matrix = vec![0u32; (m + 1) * width];
        for i in 1..=m {
            matrix[i * width] = i as u32;
        }
        for j in 1..=n {
            matrix[j] = j as u32;
        }
        for i in 1..=m {
            for j in 1..=n {
                let mut best = matrix[(i - 1) * width + j].min(matrix[i * width + j - 1]) + 1;
                if similar[(i - 1) * n + j - 1] {
                    best = best.min(matrix[(i - 1) * width + j - 1]);
                }
                matrix[i * width + j] = best.min(UNREACHABLE);
            }
        }

        // Backtrack from the bottom-right corner; operations come out in
        // reverse order.
        let mut reversed = Vec::with_capacity(m + n);
        let mut i = m;
        let mut j = n;
        while i > 0 || j > 0 {
            let here = matrix[i * width + j];
            if i > 0
                && j > 0
                && similar[(i - 1) * n + j - 1]
                && matrix[(i - 1) * width + j - 1] == here
            {
                reversed.push((Operator::Match, from[i - 1].clone()));
                i -= 1;
                j -= 1;
            } else if j > 0 && matrix[i * width + j - 1] + 1 == here {
                reversed.push((Operator::Ins, to[j - 1].clone()));
                j -= 1;
            } else {
                reversed.push((Operator::Del, from[i - 1].clone()));
                i -= 1;
            }
        }

        for (operator, token) in reversed.into_iter().rev() {
            sink.handle(operator, token);
        }
    }
}

/// Plain equality-based alignment over flat token sequences.
pub struct MatrixAligner;

impl MatrixAligner {
    /// Diffs two flat sequences by structural equality, with no recursion.
    pub fn diff(&self, from: &[Token], to: &[Token], sink: &mut dyn OperationSink) {
        SimilarityAligner::new(&TokenEquality, 1.0).align(from, to, sink);
    }
}
