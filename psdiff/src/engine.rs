//! Block-aware structural diff.
//!
//! The engine folds recognized block runs into composite elements, aligns
//! the two coarse sequences by similarity, then walks the coarse edit
//! script: matched composites are diffed pairwise (either flat or by
//! recursing the whole pipeline on their children), inserted or deleted
//! composites are unfolded verbatim. All fine-grained operations flow
//! through the shift-left → balance repair → balance check filter chain;
//! an unrepairable stream raises the error flag the orchestrator uses to
//! fall back.

use crate::align::{MatrixAligner, SimilarityAligner};
use crate::config::DiffConfig;
use crate::filter::{BalanceCheck, Balancer, ShiftLeft};
use crate::fold::fold;
use crate::op::{OperationBuffer, OperationSink, Operator};
use crate::similarity::ElementSimilarity;
use crate::token::{Element, StartTag, Token};

/// Result of scanning an element's children for block starts.
enum BlockNames {
    /// More than one distinct block name.
    Multiple,
    /// Exactly one distinct block name.
    Single(String),
}

/// The structural diff algorithm.
pub struct BlockDiff<'a> {
    config: &'a DiffConfig,
    has_error: bool,
}

impl<'a> BlockDiff<'a> {
    /// Creates an engine for the given configuration.
    pub fn new(config: &'a DiffConfig) -> Self {
        BlockDiff {
            config,
            has_error: false,
        }
    }

    /// Whether the last run produced an unbalanced stream.
    pub fn has_error(&self) -> bool {
        self.has_error
    }

    /// Diffs two token sequences, emitting filtered operations to `sink`.
    ///
    /// Check [`has_error`](Self::has_error) afterwards: when the repaired
    /// stream still fails the balance check the emitted operations must
    /// not be used.
    pub fn diff(&mut self, from: &[Token], to: &[Token], sink: &mut dyn OperationSink) {
        let check = BalanceCheck::new(sink);
        let balancer = Balancer::new(check);
        let mut shifter = ShiftLeft::new(balancer);

        shifter.start();
        self.diff_inner(from, to, &mut shifter);
        shifter.end();

        let balancer = shifter.into_inner();
        let unbalanced = balancer.is_unbalanced();
        if unbalanced || !balancer.into_inner().is_balanced() {
            self.has_error = true;
        }
    }

    /// One level of the pipeline: fold, align by similarity, unfold.
    ///
    /// Recursion re-enters here so the whole document shares a single
    /// filter chain.
    fn diff_inner(&mut self, from: &[Token], to: &[Token], sink: &mut dyn OperationSink) {
        let g_from = fold(from, &self.config.blocks);
        let g_to = fold(to, &self.config.blocks);

        let mut path = OperationBuffer::new();
        SimilarityAligner::new(&ElementSimilarity, self.config.similarity_threshold)
            .align(&g_from, &g_to, &mut path);

        self.diff_and_unfold(&g_from, &g_to, path, sink);
    }

    fn diff_and_unfold(
        &mut self,
        from: &[Token],
        to: &[Token],
        path: OperationBuffer,
        sink: &mut dyn OperationSink,
    ) {
        let mut i = 0;
        let mut j = 0;
        for operation in path.into_operations() {
            let operator = operation.operator;
            if operator == Operator::Match {
                match (&from[i], &to[j]) {
                    (Token::Element(from_el), Token::Element(to_el)) => {
                        self.diff_element(from_el, to_el, operator, sink);
                    }
                    // A zero threshold accepts pairs below the equality
                    // score; replace them rather than dropping a side.
                    (from_token, to_token) if from_token != to_token => {
                        unfold_into(sink, Operator::Del, from_token);
                        unfold_into(sink, Operator::Ins, to_token);
                    }
                    _ => sink.handle(operator, operation.token),
                }
            } else {
                match operation.token {
                    // Inserted or deleted wholesale
                    Token::Element(element) => {
                        for token in element.tokens() {
                            sink.handle(operator, token);
                        }
                    }
                    token => sink.handle(operator, token),
                }
            }
            if operator != Operator::Del {
                j += 1;
            }
            if operator != Operator::Ins {
                i += 1;
            }
        }
    }

    /// Diffs a matched pair of composite elements.
    ///
    /// Large contents segmented by differing block structure are diffed by
    /// recursing the whole pipeline; everything else gets a flat diff of
    /// the children with the wrapper tags resolved per the pseudo rules.
    fn diff_element(
        &mut self,
        from: &Element,
        to: &Element,
        operator: Operator,
        sink: &mut dyn OperationSink,
    ) {
        if self.has_multiple_or_different_blocks(from, to) {
            sink.handle(operator, Token::Start(from.start.clone()));
            self.diff_inner(&from.children, &to.children, sink);
            sink.handle(operator, Token::End(from.end.clone()));
        } else {
            let wrapper = wrapper_operator(&from.start, &to.start);
            if let Some(op) = wrapper {
                sink.handle(op, Token::Start(from.start.clone()));
            }
            MatrixAligner.diff(&from.children, &to.children, sink);
            if let Some(op) = wrapper {
                sink.handle(op, Token::End(from.end.clone()));
            }
        }
    }

    fn has_multiple_or_different_blocks(&self, from: &Element, to: &Element) -> bool {
        // No need to recurse if few tokens
        if from.children.len() <= 2 || to.children.len() <= 2 {
            return false;
        }
        let from_block = match self.first_block(from) {
            None => return false,
            Some(BlockNames::Multiple) => return true,
            Some(BlockNames::Single(name)) => name,
        };
        let to_block = match self.first_block(to) {
            None => return false,
            Some(BlockNames::Multiple) => return true,
            Some(BlockNames::Single(name)) => name,
        };
        // Only recurse if the block structure differs
        from_block != to_block
    }

    fn first_block(&self, element: &Element) -> Option<BlockNames> {
        let mut first: Option<&str> = None;
        for token in &element.children {
            if let Token::Start(s) = token {
                if self.is_block(s) {
                    match first {
                        None => first = Some(&s.name),
                        Some(name) if name != s.name => return Some(BlockNames::Multiple),
                        Some(_) => {}
                    }
                }
            }
        }
        first.map(|name| BlockNames::Single(name.to_string()))
    }

    fn is_block(&self, tag: &StartTag) -> bool {
        tag.namespace.is_empty() && self.config.blocks.contains(&tag.name)
    }
}

/// Emits a token with the given operator, unfolding composites.
fn unfold_into(sink: &mut dyn OperationSink, operator: Operator, token: &Token) {
    match token {
        Token::Element(element) => {
            for t in element.tokens() {
                sink.handle(operator, t);
            }
        }
        token => sink.handle(operator, token.clone()),
    }
}

/// Resolves how a matched pair of wrapper tags appears in the output.
///
/// Both synthetic: the wrapper is invisible and contributes nothing. One
/// synthetic: the real side's tag is reported as inserted or deleted, never
/// as a neutral boundary. Neither: a plain match.
fn wrapper_operator(from: &StartTag, to: &StartTag) -> Option<Operator> {
    match (from.synthetic, to.synthetic) {
        (true, true) => None,
        (true, false) => Some(Operator::Ins),
        (false, true) => Some(Operator::Del),
        (false, false) => Some(Operator::Match),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::op::Operation;
    use crate::token::EndTag;

    fn diff(from: &[Token], to: &[Token]) -> Vec<Operation> {
        let config = DiffConfig::default();
        let mut engine = BlockDiff::new(&config);
        let mut buffer = OperationBuffer::new();
        engine.diff(from, to, &mut buffer);
        assert!(!engine.has_error());
        buffer.into_operations()
    }

    fn para(texts: &[&str]) -> Vec<Token> {
        let mut tokens = vec![Token::start("para")];
        tokens.extend(texts.iter().map(|t| Token::text(*t)));
        tokens.push(Token::end("para"));
        tokens
    }

    #[test]
    fn test_identity() {
        let mut tokens = para(&["Hello ", "world"]);
        tokens.extend(para(&["Goodbye"]));
        let result = diff(&tokens, &tokens);
        assert_eq!(result.len(), tokens.len());
        assert!(result.iter().all(|op| op.operator == Operator::Match));
        let replayed: Vec<Token> = result.into_iter().map(|op| op.token).collect();
        assert_eq!(replayed, tokens);
    }

    #[test]
    fn test_text_change_within_block() {
        let from = para(&["Hello ", "world"]);
        let to = para(&["Hello ", "there"]);
        let result = diff(&from, &to);
        let expected = vec![
            Operation::new(Operator::Match, Token::start("para")),
            Operation::new(Operator::Match, Token::text("Hello ")),
            Operation::new(Operator::Del, Token::text("world")),
            Operation::new(Operator::Ins, Token::text("there")),
            Operation::new(Operator::Match, Token::end("para")),
        ];
        assert_eq!(result, expected);
    }

    #[test]
    fn test_dissimilar_blocks_replaced_wholesale() {
        let from = vec![
            Token::start("list"),
            Token::start("item"),
            Token::text("A"),
            Token::end("item"),
            Token::end("list"),
        ];
        let to = vec![
            Token::start("table"),
            Token::start("row"),
            Token::start("cell"),
            Token::text("A"),
            Token::end("cell"),
            Token::end("row"),
            Token::end("table"),
        ];
        let result = diff(&from, &to);
        // The whole list is deleted and the whole table inserted; the "A"
        // text is not cross-matched between them.
        let dels: Vec<_> = result
            .iter()
            .filter(|op| op.operator == Operator::Del)
            .map(|op| op.token.clone())
            .collect();
        let inss: Vec<_> = result
            .iter()
            .filter(|op| op.operator == Operator::Ins)
            .map(|op| op.token.clone())
            .collect();
        assert_eq!(dels, from);
        assert_eq!(inss, to);
        assert!(!result.iter().any(|op| op.operator == Operator::Match));
    }

    #[test]
    fn test_recurses_into_heterogeneous_blocks() {
        // Both rows hold several blocks of different names, so the engine
        // re-segments instead of flat-diffing the whole row.
        let mut from_row = vec![Token::start("row")];
        from_row.extend(para(&["one"]));
        from_row.push(Token::start("heading"));
        from_row.push(Token::text("title"));
        from_row.push(Token::end("heading"));
        from_row.push(Token::end("row"));

        let mut to_row = vec![Token::start("row")];
        to_row.extend(para(&["two"]));
        to_row.push(Token::start("heading"));
        to_row.push(Token::text("title"));
        to_row.push(Token::end("row"));
        // Restore well-formedness of the to side
        to_row.insert(to_row.len() - 1, Token::end("heading"));

        let result = diff(&from_row, &to_row);
        // Re-segmentation replaces the dissimilar paragraph as a unit
        // instead of matching its tags across both sides.
        assert!(result
            .iter()
            .any(|op| op.operator == Operator::Del && op.token == Token::start("para")));
        assert!(result
            .iter()
            .any(|op| op.operator == Operator::Del && op.token == Token::text("one")));
        assert!(result
            .iter()
            .any(|op| op.operator == Operator::Ins && op.token == Token::text("two")));
        // The unchanged heading is not smeared by the paragraph change.
        assert!(result
            .iter()
            .any(|op| op.operator == Operator::Match && op.token == Token::text("title")));
    }

    #[test]
    fn test_zero_threshold_mixed_pairing_replaces() {
        // At threshold 0 the aligner accepts a composite paired with a
        // plain token; the pair must come out as a replacement, with no
        // token dropped from either side.
        let mut config = DiffConfig::default();
        config.similarity_threshold = 0.0;
        let from = para(&["x"]);
        let to = vec![Token::text("y")];

        let mut engine = BlockDiff::new(&config);
        let mut buffer = OperationBuffer::new();
        engine.diff(&from, &to, &mut buffer);
        assert!(!engine.has_error());
        let result = buffer.into_operations();

        let dels: Vec<_> = result
            .iter()
            .filter(|op| op.operator == Operator::Del)
            .map(|op| op.token.clone())
            .collect();
        let inss: Vec<_> = result
            .iter()
            .filter(|op| op.operator == Operator::Ins)
            .map(|op| op.token.clone())
            .collect();
        assert_eq!(dels, from);
        assert_eq!(inss, to);
        assert!(!result.iter().any(|op| op.operator == Operator::Match));
    }

    #[test]
    fn test_both_synthetic_wrappers_are_suppressed() {
        let from = vec![
            Token::Start(StartTag::pseudo("para")),
            Token::text("a"),
            Token::text("b"),
            Token::End(EndTag::pseudo("para")),
        ];
        let to = vec![
            Token::Start(StartTag::pseudo("para")),
            Token::text("a"),
            Token::text("c"),
            Token::End(EndTag::pseudo("para")),
        ];
        let result = diff(&from, &to);
        assert!(result
            .iter()
            .all(|op| matches!(op.token, Token::Text(_))));
    }

    #[test]
    fn test_one_synthetic_wrapper_is_reported() {
        let from = vec![
            Token::start("para"),
            Token::text("a"),
            Token::text("b"),
            Token::end("para"),
        ];
        let to = vec![
            Token::Start(StartTag::pseudo("para")),
            Token::text("a"),
            Token::text("b"),
            Token::End(EndTag::pseudo("para")),
        ];
        let result = diff(&from, &to);
        // The real tag was removed on the to side: report it as deleted.
        assert_eq!(
            result.first().map(|op| op.operator),
            Some(Operator::Del)
        );
        assert_eq!(result.first().map(|op| op.token.clone()), Some(Token::start("para")));
    }
}
