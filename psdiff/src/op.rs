//! Operations and the sink contract connecting pipeline stages.
//!
//! Every stage of the engine either produces or consumes an ordered stream
//! of `(Operator, Token)` pairs. Streaming stages implement [`OperationSink`]
//! and forward to a downstream sink; [`OperationBuffer`] collects a stream
//! for later replay.

use crate::token::Token;

/// The kind of edit applied to a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    /// The token only exists in the target sequence.
    Ins,
    /// The token only exists in the source sequence.
    Del,
    /// The token exists in both sequences.
    Match,
}

/// A single diff operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Operation {
    /// The edit kind.
    pub operator: Operator,
    /// The token the edit applies to.
    pub token: Token,
}

impl Operation {
    /// Creates an operation.
    pub fn new(operator: Operator, token: Token) -> Self {
        Operation { operator, token }
    }
}

/// Receiver of an ordered operation stream.
///
/// Filters implement this trait and forward (possibly rewritten) operations
/// to the next sink in the chain. `start` and `end` bracket one complete
/// stream; `end` must flush any buffered state.
pub trait OperationSink {
    /// Signals the start of an operation stream.
    fn start(&mut self) {}

    /// Handles the next operation.
    fn handle(&mut self, operator: Operator, token: Token);

    /// Signals the end of the stream; flushes buffered state.
    fn end(&mut self) {}
}

impl<S: OperationSink + ?Sized> OperationSink for &mut S {
    fn start(&mut self) {
        (**self).start();
    }

    fn handle(&mut self, operator: Operator, token: Token) {
        (**self).handle(operator, token);
    }

    fn end(&mut self) {
        (**self).end();
    }
}

/// A sink that collects the operations it receives.
#[derive(Debug, Default)]
pub struct OperationBuffer {
    operations: Vec<Operation>,
}

impl OperationBuffer {
    /// Creates an empty buffer.
    pub fn new() -> Self {
        OperationBuffer::default()
    }

    /// The operations collected so far.
    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    /// Consumes the buffer, returning the collected operations.
    pub fn into_operations(self) -> Vec<Operation> {
        self.operations
    }

    /// Replays the collected operations into another sink.
    pub fn apply_to(&self, sink: &mut dyn OperationSink) {
        for operation in &self.operations {
            sink.handle(operation.operator, operation.token.clone());
        }
    }
}

impl OperationSink for OperationBuffer {
    fn handle(&mut self, operator: Operator, token: Token) {
        self.operations.push(Operation::new(operator, token));
    }
}
