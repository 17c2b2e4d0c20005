//! Two-tier whitespace stripping.

use rustc_hash::FxHashSet;

use crate::token::Token;

/// Strips ignorable whitespace-only text tokens before diffing.
///
/// Two tiers: under "always" elements whitespace children are dropped
/// unconditionally; under "maybe" elements they are dropped only when the
/// element has other content, so an element whose only content is
/// whitespace keeps it. Everything else passes through.
pub struct WhitespaceStripper {
    always: FxHashSet<String>,
    maybe: FxHashSet<String>,
}

#[derive(Clone, Copy, PartialEq)]
enum Mode {
    Keep,
    Strip,
}

impl WhitespaceStripper {
    /// Creates a stripper with the given always-ignore and maybe-ignore
    /// element name sets.
    pub fn new(always: FxHashSet<String>, maybe: FxHashSet<String>) -> Self {
        WhitespaceStripper { always, maybe }
    }

    /// Preconfigured for the PSML vocabulary.
    pub fn for_psml() -> Self {
        Self::new(
            names(&["row", "list", "nlist", "table", "fragment"]),
            names(&["cell", "item", "para", "block", "blockxref", "hcell"]),
        )
    }
}

fn names(list: &[&str]) -> FxHashSet<String> {
    list.iter().map(|n| (*n).to_string()).collect()
}

impl super::SequenceProcessor for WhitespaceStripper {
    fn process(&self, tokens: Vec<Token>) -> Vec<Token> {
        let mut modes = vec![Mode::Keep];
        let mut result = Vec::with_capacity(tokens.len());
        for (i, token) in tokens.iter().enumerate() {
            match token {
                Token::Start(s) => {
                    let mode = if s.namespace.is_empty() && self.always.contains(&s.name) {
                        Mode::Strip
                    } else if s.namespace.is_empty()
                        && self.maybe.contains(&s.name)
                        && has_other_content(&tokens, i)
                    {
                        Mode::Strip
                    } else {
                        Mode::Keep
                    };
                    modes.push(mode);
                    result.push(token.clone());
                }
                Token::End(_) => {
                    modes.pop();
                    result.push(token.clone());
                }
                Token::Text(t) if t.whitespace => {
                    if modes.last() == Some(&Mode::Keep) {
                        result.push(token.clone());
                    }
                }
                _ => result.push(token.clone()),
            }
        }
        result
    }
}

/// Whether the element starting at `start` contains anything other than
/// whitespace text.
fn has_other_content(tokens: &[Token], start: usize) -> bool {
    let mut depth = 1;
    for token in &tokens[start + 1..] {
        match token {
            Token::Start(_) | Token::Element(_) => return true,
            Token::End(_) => {
                depth -= 1;
                if depth == 0 {
                    return false;
                }
            }
            Token::Text(t) if !t.whitespace => return true,
            _ => {}
        }
    }
    false
}
