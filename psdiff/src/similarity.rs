//! Token similarity scoring.
//!
//! The similarity aligner is parameterized by a scoring function returning
//! a value in `[0, 1]`. For plain tokens the score is equality; for two
//! folded elements with the same start tag it is derived from the
//! proportion of matched vs changed text tokens in a quick flat alignment
//! of their children.

use crate::align::MatrixAligner;
use crate::op::{OperationSink, Operator};
use crate::token::{Element, Token};

/// A similarity function over tokens.
pub trait Similarity {
    /// Scores the similarity of two tokens, between 0 and 1.
    fn score(&self, a: &Token, b: &Token) -> f32;
}

/// Similarity by strict structural equality.
pub struct TokenEquality;

impl Similarity for TokenEquality {
    fn score(&self, a: &Token, b: &Token) -> f32 {
        if a == b {
            1.0
        } else {
            0.0
        }
    }
}

/// Similarity for folded block elements.
///
/// Elements with different start tags score 0 without recursing; elements
/// with the same tag are scored by a flat alignment of their children,
/// counting edited vs matched text tokens, with a small bonus for longer
/// unchanged content.
pub struct ElementSimilarity;

impl Similarity for ElementSimilarity {
    fn score(&self, a: &Token, b: &Token) -> f32 {
        match (a, b) {
            (Token::Element(a), Token::Element(b)) => score_elements(a, b),
            _ => {
                if a == b {
                    1.0
                } else {
                    0.0
                }
            }
        }
    }
}

fn score_elements(a: &Element, b: &Element) -> f32 {
    // Don't bother if the first token is different
    if a.start != b.start {
        return 0.0;
    }
    if a.children.is_empty() && b.children.is_empty() {
        return 1.0;
    }
    let mut counter = EditCounter::default();
    MatrixAligner.diff(&a.children, &b.children, &mut counter);
    counter.score()
}

/// Counts edited and matched text tokens in a diff to derive a score.
#[derive(Debug, Default)]
struct EditCounter {
    edits: u32,
    tokens: u32,
}

impl EditCounter {
    fn edit_score(&self) -> f32 {
        if self.tokens == 0 {
            return 0.5;
        }
        if self.edits == 0 {
            return 1.0;
        }
        1.0 - self.edits as f32 / self.tokens as f32
    }

    fn length_bonus(&self) -> f32 {
        (1.0 + (self.tokens - self.edits) as f32).ln() / 10.0
    }

    fn score(&self) -> f32 {
        (self.edit_score() + self.length_bonus()).min(1.0)
    }
}

impl OperationSink for EditCounter {
    fn handle(&mut self, operator: Operator, token: Token) {
        if let Token::Text(_) = token {
            if operator == Operator::Match {
                self.tokens += 2;
            } else {
                self.edits += 1;
                self.tokens += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::{EndTag, StartTag};

    fn element(name: &str, texts: &[&str]) -> Token {
        Token::Element(Element::new(
            StartTag::new(name),
            EndTag::new(name),
            texts.iter().map(|t| Token::text(*t)).collect(),
        ))
    }

    #[test]
    fn test_different_tags_score_zero() {
        let sim = ElementSimilarity;
        assert_eq!(sim.score(&element("para", &["x"]), &element("item", &["x"])), 0.0);
    }

    #[test]
    fn test_empty_elements_score_one() {
        let sim = ElementSimilarity;
        assert_eq!(sim.score(&element("para", &[]), &element("para", &[])), 1.0);
    }

    #[test]
    fn test_identical_content_scores_one() {
        let sim = ElementSimilarity;
        let score = sim.score(&element("para", &["a", "b"]), &element("para", &["a", "b"]));
        assert_eq!(score, 1.0);
    }

    #[test]
    fn test_partial_overlap_scores_between() {
        let sim = ElementSimilarity;
        let score = sim.score(
            &element("para", &["a", "b", "c"]),
            &element("para", &["a", "b", "x"]),
        );
        assert!(score > 0.5, "score was {score}");
        assert!(score < 1.0, "score was {score}");
    }

    #[test]
    fn test_disjoint_content_scores_low() {
        let sim = ElementSimilarity;
        let score = sim.score(
            &element("para", &["a", "b", "c"]),
            &element("para", &["x", "y", "z"]),
        );
        assert!(score < 0.5, "score was {score}");
    }

    #[test]
    fn test_plain_tokens_score_by_equality() {
        let sim = ElementSimilarity;
        assert_eq!(sim.score(&Token::text("a"), &Token::text("a")), 1.0);
        assert_eq!(sim.score(&Token::text("a"), &Token::text("b")), 0.0);
        assert_eq!(sim.score(&Token::text("a"), &Token::start("a")), 0.0);
    }
}
