//! Cosmetic element renames and their reversal.

use crate::config::NormalizeRule;
use crate::op::{Operation, OperationSink, Operator};
use crate::token::{Attribute, EndTag, StartTag, Token};

/// Replaces a source element by its structurally equivalent target.
///
/// The renamed start tag is followed by a `source="true"` attribute so the
/// [`ElementDenormalizer`] can restore the original name after diffing.
/// For example `<hcell>` becomes `<cell hcell="true">`.
pub struct ElementNormalizer {
    rule: NormalizeRule,
}

impl ElementNormalizer {
    /// Creates a normalizer applying the given rename rule.
    pub fn new(rule: NormalizeRule) -> Self {
        ElementNormalizer { rule }
    }

    fn is_source_start(&self, token: &Token) -> bool {
        matches!(token, Token::Start(s) if s.name == self.rule.source && s.namespace.is_empty())
    }

    fn is_source_end(&self, token: &Token) -> bool {
        matches!(token, Token::End(e) if e.name == self.rule.source && e.namespace.is_empty())
    }
}

impl super::SequenceProcessor for ElementNormalizer {
    fn process(&self, tokens: Vec<Token>) -> Vec<Token> {
        if !tokens.iter().any(|t| self.is_source_start(t)) {
            return tokens;
        }
        let mut result = Vec::with_capacity(tokens.len() + 4);
        for token in tokens {
            if self.is_source_start(&token) {
                result.push(Token::Start(StartTag::new(&*self.rule.target)));
                result.push(Token::attr(&*self.rule.source, "true"));
            } else if self.is_source_end(&token) {
                result.push(Token::End(EndTag::new(&*self.rule.target)));
            } else {
                result.push(token);
            }
        }
        result
    }
}

/// Restores renamed elements in the operation stream after diffing.
///
/// Watches for start tags produced by an [`ElementNormalizer`]; when the
/// flag attribute follows on an inserted or matched element, the start tag
/// is substituted back to the original name and the corresponding end tag
/// is substituted when its nesting level closes.
pub struct ElementDenormalizer<S: OperationSink> {
    target: S,
    rules: Vec<NormalizeRule>,
    /// Pending start tag and its attributes, held until we know whether
    /// the flag attribute follows.
    buffer: Vec<Operation>,
    /// Renamed elements awaiting their end tag, with the nesting level at
    /// which they close.
    to_close: Vec<(String, i32)>,
    level: i32,
}

impl<S: OperationSink> ElementDenormalizer<S> {
    /// Creates a denormalizer for the given rules, forwarding to `target`.
    pub fn new(target: S, rules: Vec<NormalizeRule>) -> Self {
        ElementDenormalizer {
            target,
            rules,
            buffer: Vec::new(),
            to_close: Vec::new(),
            level: 0,
        }
    }

    /// Consumes the filter, returning the downstream sink.
    pub fn into_inner(self) -> S {
        self.target
    }

    fn is_watched(&self, token: &Token) -> bool {
        match token {
            Token::Start(s) if s.namespace.is_empty() => {
                self.rules.iter().any(|r| r.target == s.name)
            }
            _ => false,
        }
    }

    fn handle_attribute(&mut self, operator: Operator, attribute: Attribute) {
        // Only restore inserted or matched elements; a deleted flag
        // attribute refers to the other side.
        if operator != Operator::Del && attribute.value == "true" {
            let element = self.buffer[0].token.name().unwrap_or_default().to_string();
            let restored = self
                .rules
                .iter()
                .find(|r| r.target == element && r.source == attribute.name)
                .map(|r| r.source.clone());
            if let Some(source) = restored {
                let opener = self.buffer[0].operator;
                self.buffer[0] = Operation::new(opener, Token::Start(StartTag::new(&*source)));
                self.to_close.push((source, self.level - 1));
            }
        }
        self.buffer.push(Operation::new(operator, Token::Attr(attribute)));
    }

    fn flush_buffer(&mut self) {
        for operation in self.buffer.drain(..) {
            self.target.handle(operation.operator, operation.token);
        }
    }
}

impl<S: OperationSink> OperationSink for ElementDenormalizer<S> {
    fn start(&mut self) {
        self.target.start();
    }

    fn handle(&mut self, operator: Operator, token: Token) {
        match &token {
            Token::Start(_) => self.level += 1,
            Token::End(_) => {
                self.level -= 1;
                if self.to_close.last().is_some_and(|(_, l)| *l == self.level) {
                    if let Some((name, _)) = self.to_close.pop() {
                        self.flush_buffer();
                        self.target.handle(operator, Token::End(EndTag::new(name)));
                    }
                    return;
                }
            }
            _ => {}
        }

        if self.is_watched(&token) {
            self.flush_buffer();
            self.buffer.push(Operation::new(operator, token));
            return;
        }

        if !self.buffer.is_empty() {
            match token {
                Token::Attr(attribute) => self.handle_attribute(operator, attribute),
                token => {
                    self.flush_buffer();
                    self.target.handle(operator, token);
                }
            }
            return;
        }

        self.target.handle(operator, token);
    }

    fn end(&mut self) {
        self.flush_buffer();
        self.target.end();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::SequenceProcessor;
    use crate::op::OperationBuffer;

    fn rules() -> Vec<NormalizeRule> {
        vec![
            NormalizeRule::new("hcell", "cell"),
            NormalizeRule::new("nlist", "list"),
        ]
    }

    /// Parses `+<list>`, `-@hcell=true`, `</para>`, `text` style shorthand.
    fn op(shorthand: &str) -> Operation {
        let (operator, rest) = match shorthand.chars().next() {
            Some('+') => (Operator::Ins, &shorthand[1..]),
            Some('-') => (Operator::Del, &shorthand[1..]),
            _ => (Operator::Match, shorthand),
        };
        let token = if let Some(name) = rest.strip_prefix("</") {
            Token::end(name.trim_end_matches('>'))
        } else if let Some(name) = rest.strip_prefix('<') {
            Token::start(name.trim_end_matches('>'))
        } else if let Some(attr) = rest.strip_prefix('@') {
            let (name, value) = attr.split_once('=').unwrap();
            Token::attr(name, value)
        } else {
            Token::text(rest)
        };
        Operation::new(operator, token)
    }

    fn ops(items: &[&str]) -> Vec<Operation> {
        items.iter().map(|s| op(s)).collect()
    }

    fn denormalize(input: &[Operation]) -> Vec<Operation> {
        let mut denormalizer = ElementDenormalizer::new(OperationBuffer::new(), rules());
        for operation in input {
            denormalizer.handle(operation.operator, operation.token.clone());
        }
        denormalizer.end();
        denormalizer.into_inner().into_operations()
    }

    fn assert_no_change(items: &[&str]) {
        let input = ops(items);
        assert_eq!(denormalize(&input), input, "changed: {items:?}");
    }

    #[test]
    fn test_normalizer_renames_and_flags() {
        let input = vec![
            Token::start("row"),
            Token::start("hcell"),
            Token::text("x"),
            Token::end("hcell"),
            Token::end("row"),
        ];
        let normalizer = ElementNormalizer::new(NormalizeRule::new("hcell", "cell"));
        let result = normalizer.process(input);
        assert_eq!(
            result,
            vec![
                Token::start("row"),
                Token::start("cell"),
                Token::attr("hcell", "true"),
                Token::text("x"),
                Token::end("cell"),
                Token::end("row"),
            ]
        );
    }

    #[test]
    fn test_normalizer_leaves_other_sequences_alone() {
        let input = vec![Token::start("para"), Token::text("x"), Token::end("para")];
        let normalizer = ElementNormalizer::new(NormalizeRule::new("hcell", "cell"));
        assert_eq!(normalizer.process(input.clone()), input);
    }

    #[test]
    fn test_denormalize_no_change() {
        assert_no_change(&["<para>", "text", "</para>"]);
        assert_no_change(&["<row>", "<cell>", "text", "</cell>", "</row>"]);
        assert_no_change(&["<row>", "<cell>", "-@hcell=true", "text", "</cell>", "</row>"]);
        assert_no_change(&["<row>", "<cell>", "+@nlist=true", "text", "</cell>", "</row>"]);
        assert_no_change(&["<row>", "<cell>", "@nlist=true", "text", "</cell>", "</row>"]);
        assert_no_change(&["<row>", "-@hcell=true", "<cell>", "text", "</cell>", "</row>"]);
        assert_no_change(&["<list>", "-@hcell=true", "<item>", "text", "</item>", "</list>"]);
        assert_no_change(&["<list>", "@hcell=true", "<item>", "text", "</item>", "</list>"]);
        assert_no_change(&["<list>", "+@hcell=true", "<item>", "text", "</item>", "</list>"]);
        assert_no_change(&["<list>", "-@nlist=true", "<item>", "text", "</item>", "</list>"]);
        assert_no_change(&["<list>", "<item>", "+@nlist=true", "text", "</item>", "</list>"]);
    }

    #[test]
    fn test_denormalize_restores_inserted_flag() {
        let input = ops(&["<row>", "<cell>", "+@hcell=true", "text", "</cell>", "</row>"]);
        let expected = ops(&["<row>", "<hcell>", "+@hcell=true", "text", "</hcell>", "</row>"]);
        assert_eq!(denormalize(&input), expected);
    }

    #[test]
    fn test_denormalize_restores_matched_flag() {
        let input = ops(&["<row>", "<cell>", "@hcell=true", "text", "</cell>", "</row>"]);
        let expected = ops(&["<row>", "<hcell>", "@hcell=true", "text", "</hcell>", "</row>"]);
        assert_eq!(denormalize(&input), expected);
    }

    #[test]
    fn test_denormalize_with_other_attributes() {
        let input = ops(&[
            "<row>", "<cell>", "@colspan=2", "@hcell=true", "text", "</cell>", "</row>",
        ]);
        let expected = ops(&[
            "<row>", "<hcell>", "@colspan=2", "@hcell=true", "text", "</hcell>", "</row>",
        ]);
        assert_eq!(denormalize(&input), expected);
    }

    #[test]
    fn test_denormalize_restores_list() {
        let input = ops(&["<list>", "+@nlist=true", "<item>", "text", "</item>", "</list>"]);
        let expected = ops(&["<nlist>", "+@nlist=true", "<item>", "text", "</item>", "</nlist>"]);
        assert_eq!(denormalize(&input), expected);

        let input = ops(&["<list>", "@nlist=true", "<item>", "text", "</item>", "</list>"]);
        let expected = ops(&["<nlist>", "@nlist=true", "<item>", "text", "</item>", "</nlist>"]);
        assert_eq!(denormalize(&input), expected);
    }

    #[test]
    fn test_denormalize_inserted_list() {
        let input = ops(&["+<list>", "+@nlist=true", "<item>", "text", "</item>", "+</list>"]);
        let expected =
            ops(&["+<nlist>", "+@nlist=true", "<item>", "text", "</item>", "+</nlist>"]);
        assert_eq!(denormalize(&input), expected);
    }

    #[test]
    fn test_denormalize_nested_lists() {
        let input = ops(&[
            "<fragment>", "<list>", "@nlist=true", "<item>", "+<list>", "+@nlist=true",
            "<item>", "text", "</item>", "+</list>", "</item>", "</list>", "</fragment>",
        ]);
        let expected = ops(&[
            "<fragment>", "<nlist>", "@nlist=true", "<item>", "+<nlist>", "+@nlist=true",
            "<item>", "text", "</item>", "+</nlist>", "</item>", "</nlist>", "</fragment>",
        ]);
        assert_eq!(denormalize(&input), expected);
    }

    #[test]
    fn test_denormalize_mixed_rules() {
        let input = ops(&[
            "<table>", "<row>", "<cell>", "@hcell=true", "<item>", "+<list>", "+@nlist=true",
            "<item>", "text", "</item>", "+</list>", "</item>", "</cell>", "</row>", "</table>",
        ]);
        let expected = ops(&[
            "<table>", "<row>", "<hcell>", "@hcell=true", "<item>", "+<nlist>", "+@nlist=true",
            "<item>", "text", "</item>", "+</nlist>", "</item>", "</hcell>", "</row>", "</table>",
        ]);
        assert_eq!(denormalize(&input), expected);
    }
}
