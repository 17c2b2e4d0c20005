//! Balance repair and verification.
//!
//! The raw operation stream produced by unfolding can interleave start and
//! end tags from both sides in ways that no longer nest. [`Balancer`]
//! repairs the stream by synthesizing missing end tags and swallowing the
//! genuine ends of force-closed elements; [`BalanceCheck`] verifies the
//! final stream and exposes the result, which is the orchestrator's
//! fallback trigger.

use crate::op::{OperationSink, Operator};
use crate::token::{EndTag, StartTag, Token};

/// Repairing filter that keeps emitted tags correctly nested.
///
/// Invariant restored: every emitted end tag closes the most recently
/// emitted unclosed start tag of the same name. An end tag whose start is
/// nowhere on the open stack cannot be repaired; it is dropped and the
/// unbalanced flag is set.
pub struct Balancer<S: OperationSink> {
    target: S,
    /// Open tags with the operator they were emitted with.
    stack: Vec<(Operator, StartTag)>,
    /// Names of force-closed elements whose genuine end is still to come.
    swallow: Vec<String>,
    unbalanced: bool,
}

impl<S: OperationSink> Balancer<S> {
    /// Creates a balancer forwarding to `target`.
    pub fn new(target: S) -> Self {
        Balancer {
            target,
            stack: Vec::new(),
            swallow: Vec::new(),
            unbalanced: false,
        }
    }

    /// Whether an unrepairable end tag was encountered.
    pub fn is_unbalanced(&self) -> bool {
        self.unbalanced
    }

    /// Consumes the filter, returning the downstream sink.
    pub fn into_inner(self) -> S {
        self.target
    }

    fn force_close_top(&mut self) {
        if let Some((operator, start)) = self.stack.pop() {
            self.swallow.push(start.name.clone());
            self.target
                .handle(operator, Token::End(EndTag::closing(&start)));
        }
    }
}

impl<S: OperationSink> OperationSink for Balancer<S> {
    fn start(&mut self) {
        self.target.start();
    }

    fn handle(&mut self, operator: Operator, token: Token) {
        match &token {
            Token::Start(s) => {
                self.stack.push((operator, s.clone()));
                self.target.handle(operator, token);
            }
            Token::End(e) => {
                if let Some((top_operator, top)) = self.stack.last() {
                    if top.name == e.name && top.namespace == e.namespace {
                        // Emit with the opener's operator so both side
                        // projections stay balanced.
                        let operator = *top_operator;
                        self.stack.pop();
                        self.target.handle(operator, token);
                        return;
                    }
                }
                if self.swallow.last().map(String::as_str) == Some(e.name.as_str()) {
                    self.swallow.pop();
                    return;
                }
                if self.stack.iter().any(|(_, s)| s.name == e.name) {
                    while self
                        .stack
                        .last()
                        .is_some_and(|(_, s)| s.name != e.name)
                    {
                        self.force_close_top();
                    }
                    if let Some((top_operator, _)) = self.stack.last() {
                        let operator = *top_operator;
                        self.stack.pop();
                        self.target.handle(operator, token);
                    }
                } else {
                    // No matching open tag anywhere, repair is impossible.
                    self.unbalanced = true;
                }
            }
            _ => self.target.handle(operator, token),
        }
    }

    fn end(&mut self) {
        while let Some((operator, start)) = self.stack.pop() {
            self.target
                .handle(operator, Token::End(EndTag::closing(&start)));
        }
        self.target.end();
    }
}

/// Pass-through filter that verifies the stream nests correctly.
pub struct BalanceCheck<S: OperationSink> {
    target: S,
    stack: Vec<String>,
    balanced: bool,
}

impl<S: OperationSink> BalanceCheck<S> {
    /// Creates a checking filter forwarding to `target`.
    pub fn new(target: S) -> Self {
        BalanceCheck {
            target,
            stack: Vec::new(),
            balanced: true,
        }
    }

    /// Whether the stream seen so far nests correctly.
    pub fn is_balanced(&self) -> bool {
        self.balanced && self.stack.is_empty()
    }

    /// Consumes the filter, returning the downstream sink.
    pub fn into_inner(self) -> S {
        self.target
    }
}

impl<S: OperationSink> OperationSink for BalanceCheck<S> {
    fn start(&mut self) {
        self.target.start();
    }

    fn handle(&mut self, operator: Operator, token: Token) {
        match &token {
            Token::Start(s) => self.stack.push(s.name.clone()),
            Token::End(e) => {
                if self.stack.pop().as_deref() != Some(e.name.as_str()) {
                    self.balanced = false;
                }
            }
            _ => {}
        }
        self.target.handle(operator, token);
    }

    fn end(&mut self) {
        self.target.end();
    }
}
