//! Shift-left heuristic.
//!
//! Alignment tie-breaking can leave a changed run sandwiched between two
//! copies of the same unchanged token, which renders as distracting
//! flicker. When a match arrives right after a run of changes whose last
//! token equals the match before the run, this filter swaps the two so the
//! change reads as "delete X, then unchanged Y", shifting as far left as
//! profitable while the affected range is not already self-balanced.

use crate::op::{Operation, OperationSink, Operator};
use crate::token::Token;

/// Buffering filter that relocates equal-token matches across changed runs.
pub struct ShiftLeft<S: OperationSink> {
    target: S,
    operations: Vec<Operation>,
    last_operator: Operator,
    last_count: usize,
    shifted: usize,
}

impl<S: OperationSink> ShiftLeft<S> {
    /// Creates a shift-left filter forwarding to `target`.
    pub fn new(target: S) -> Self {
        ShiftLeft {
            target,
            operations: Vec::new(),
            last_operator: Operator::Match,
            last_count: 0,
            shifted: 0,
        }
    }

    /// Number of shift operations applied so far.
    pub fn shifted(&self) -> usize {
        self.shifted
    }

    /// Consumes the filter, returning the downstream sink.
    pub fn into_inner(self) -> S {
        self.target
    }

    fn shift_operations(&mut self) -> usize {
        let run = self.last_count;
        let len = self.operations.len();
        let mut shift = 0;
        if len <= run {
            return 0;
        }
        let mut p = len - 1;
        while p >= run {
            let changed = &self.operations[p];
            let unchanged = &self.operations[p - run];
            if unchanged.operator != Operator::Match || changed.token != unchanged.token {
                break;
            }
            // A self-balanced run renders cleanly where it is.
            if is_balanced(&self.operations[p - run + 1..=p]) {
                return shift;
            }
            let changed_operator = changed.operator;
            let token = changed.token.clone();
            self.operations[p] = Operation::new(Operator::Match, token.clone());
            self.operations[p - run] = Operation::new(changed_operator, token);
            shift += 1;
            if p == run {
                break;
            }
            p -= 1;
        }
        shift
    }

    fn flush(&mut self) {
        for operation in self.operations.drain(..) {
            self.target.handle(operation.operator, operation.token);
        }
    }
}

impl<S: OperationSink> OperationSink for ShiftLeft<S> {
    fn start(&mut self) {
        self.target.start();
    }

    fn handle(&mut self, operator: Operator, token: Token) {
        // Shift-left opportunity when we match after changes
        if operator == Operator::Match && self.last_operator != operator && self.last_count > 1 {
            let shift = self.shift_operations();
            self.shifted += shift;
            self.flush();
        }

        if self.last_operator != operator {
            self.last_count = 0;
        }
        self.last_count += 1;
        self.last_operator = operator;

        self.operations.push(Operation::new(operator, token));
    }

    fn end(&mut self) {
        self.flush();
        self.target.end();
    }
}

/// Whether the tags in the given operations nest correctly, irrespective
/// of their operators.
fn is_balanced(operations: &[Operation]) -> bool {
    let mut stack: Vec<&str> = Vec::new();
    for operation in operations {
        match &operation.token {
            Token::Start(s) => stack.push(&s.name),
            Token::End(e) => {
                if stack.pop() != Some(e.name.as_str()) {
                    return false;
                }
            }
            _ => {}
        }
    }
    stack.is_empty()
}
