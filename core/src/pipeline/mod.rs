// saga_pipe/src/pipeline/mod.rs

//! Defines the `Pipeline<C, E>` struct, its construction and its execution logic.

pub(crate) mod compensation;
pub mod definition;
pub mod execution;

// Re-export the main Pipeline struct
pub use definition::Pipeline;
