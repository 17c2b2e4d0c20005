//! Text coalescing for the bounded fallback.

use crate::token::Token;

/// Merges adjacent text tokens into single longer runs.
///
/// Used when a comparison exceeds the event ceiling: coarser text tokens
/// shorten both sequences at the cost of diff granularity. Produces a new
/// sequence; the input is never mutated.
pub fn coalesce_text(tokens: &[Token]) -> Vec<Token> {
    let mut result = Vec::with_capacity(tokens.len());
    let mut pending: Option<String> = None;
    for token in tokens {
        match token {
            Token::Text(t) => {
                pending.get_or_insert_with(String::new).push_str(&t.value);
            }
            other => {
                if let Some(value) = pending.take() {
                    result.push(Token::text(value));
                }
                result.push(other.clone());
            }
        }
    }
    if let Some(value) = pending {
        result.push(Token::text(value));
    }
    result
}
