//! Folding block runs into composite tokens.
//!
//! A fold pass scans a flat token sequence left to right and collapses each
//! top-level run bounded by a recognized block start/end pair into a single
//! [`Element`] token. Block names nested inside another block are left as
//! plain start/end tokens; the recursive differ decides whether to descend,
//! not the folder.

use rustc_hash::FxHashSet;

use crate::token::{Element, StartTag, Token};

fn is_block(blocks: &FxHashSet<String>, name: &str, namespace: &str) -> bool {
    // Block names are only recognized in the default namespace
    namespace.is_empty() && blocks.contains(name)
}

/// Folds top-level block runs into [`Element`] tokens.
///
/// All other tokens pass through unchanged. The inverse is
/// [`Element::tokens`], used when a composite participates in an
/// insert or delete.
pub fn fold(tokens: &[Token], blocks: &FxHashSet<String>) -> Vec<Token> {
    let mut out = Vec::with_capacity(tokens.len());
    let mut stack: Vec<StartTag> = Vec::new();
    let mut children: Option<Vec<Token>> = None;

    for token in tokens {
        if children.is_some() {
            let closes = matches!(token, Token::End(e)
                if is_block(blocks, &e.name, &e.namespace)
                    && stack.len() == 1
                    && stack[0].name == e.name);
            if closes {
                if let (Token::End(end), Some(start)) = (token, stack.pop()) {
                    let kids = children.take().unwrap_or_default();
                    out.push(Token::Element(Element::new(start, end.clone(), kids)));
                }
            } else {
                match token {
                    Token::Start(s) => stack.push(s.clone()),
                    Token::End(_) => {
                        stack.pop();
                    }
                    _ => {}
                }
                if let Some(kids) = children.as_mut() {
                    kids.push(token.clone());
                }
            }
        } else {
            match token {
                Token::Start(s) if is_block(blocks, &s.name, &s.namespace) => {
                    children = Some(Vec::new());
                    stack.push(s.clone());
                }
                _ => out.push(token.clone()),
            }
        }
    }

    // Malformed input: a block start without its end. Flush the partial
    // fold so no token is lost.
    if let Some(kids) = children.take() {
        if let Some(start) = stack.pop() {
            out.push(Token::Start(start));
        }
        out.extend(kids);
    }

    out
}
