// saga_pipe/src/conditional/mod.rs

//! Conditional composition inside a pipeline.
//!
//! - `branch` gates a contiguous run of operations on one predicate evaluation
//!   and splices them into the parent, sharing its compensation stack.
//! - `switch_on` routes to at most one case's operations based on a selector
//!   value, unwinding a failing case locally.

pub mod branch;
pub mod switch;

// Re-export the switch builder for users; `branch` is a method on `Pipeline`.
pub use switch::SwitchBuilder;
