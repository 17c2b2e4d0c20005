//! Streaming post-processors for the operation stream.
//!
//! Filters implement [`OperationSink`](crate::op::OperationSink) and wrap a
//! downstream sink, forming an explicit chain: shift-left → balance repair →
//! balance check → output.

mod balance;
mod shift_left;

pub use balance::{BalanceCheck, Balancer};
pub use shift_left::ShiftLeft;
