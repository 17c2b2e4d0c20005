//! Pseudo-paragraph wrapping.

use rustc_hash::FxHashSet;

use crate::token::{EndTag, StartTag, Token};

/// Wraps bare text directly under a label element in pseudo paragraphs.
///
/// Label elements can hold either unstructured text or a sequence of
/// container elements; wrapping the unstructured form gives both sides the
/// same shape before diffing. The pseudo tags carry the synthetic flag so
/// the differ can tell them apart from real paragraphs.
pub struct BlockNormalizer {
    para: String,
    labels: FxHashSet<String>,
    containers: FxHashSet<String>,
}

impl BlockNormalizer {
    /// Creates a normalizer wrapping text under `labels` in pseudo `para`
    /// elements, treating `containers` as structural boundaries.
    pub fn new(
        para: impl Into<String>,
        labels: FxHashSet<String>,
        containers: FxHashSet<String>,
    ) -> Self {
        BlockNormalizer {
            para: para.into(),
            labels,
            containers,
        }
    }

    /// Preconfigured for the PSML vocabulary.
    pub fn for_psml() -> Self {
        Self::new(
            "para",
            names(&["block"]),
            names(&["para", "list", "nlist", "block", "heading", "table", "preformat"]),
        )
    }

    /// Preconfigured for HTML.
    pub fn for_html() -> Self {
        Self::new(
            "p",
            names(&["div"]),
            names(&[
                "p", "ol", "ul", "div", "h1", "h2", "h3", "h4", "h5", "h6", "table", "pre",
            ]),
        )
    }

    fn is_container(&self, tag: &StartTag) -> bool {
        tag.namespace.is_empty() && self.containers.contains(&tag.name)
    }

    fn is_label(&self, tag: Option<&StartTag>) -> bool {
        tag.is_some_and(|t| t.namespace.is_empty() && self.labels.contains(&t.name))
    }

    fn is_pseudo(&self, tag: Option<&StartTag>) -> bool {
        tag.is_some_and(|t| t.synthetic && t.name == self.para)
    }
}

fn names(list: &[&str]) -> FxHashSet<String> {
    list.iter().map(|n| (*n).to_string()).collect()
}

impl super::SequenceProcessor for BlockNormalizer {
    fn process(&self, tokens: Vec<Token>) -> Vec<Token> {
        let mut context: Vec<StartTag> = Vec::new();
        let mut result = Vec::with_capacity(tokens.len());

        let start_pseudo = |context: &mut Vec<StartTag>, result: &mut Vec<Token>| {
            let start = StartTag::pseudo(&*self.para);
            result.push(Token::Start(start.clone()));
            context.push(start);
        };
        let end_pseudo = |context: &mut Vec<StartTag>, result: &mut Vec<Token>| {
            result.push(Token::End(EndTag::pseudo(&*self.para)));
            context.pop();
        };

        for token in tokens {
            match &token {
                Token::Text(t) => {
                    // Bare text directly under a label gets a pseudo parent
                    if !t.whitespace && self.is_label(context.last()) {
                        start_pseudo(&mut context, &mut result);
                    }
                }
                Token::Start(s) => {
                    if self.is_container(s) {
                        if self.is_pseudo(context.last()) {
                            end_pseudo(&mut context, &mut result);
                        }
                    } else if self.is_label(context.last()) {
                        // Inline content under a label is wrapped too
                        start_pseudo(&mut context, &mut result);
                    }
                    context.push(s.clone());
                }
                Token::End(e) => {
                    if self.labels.contains(&e.name) && self.is_pseudo(context.last()) {
                        end_pseudo(&mut context, &mut result);
                    }
                    context.pop();
                }
                _ => {}
            }
            result.push(token);
        }
        result
    }
}
