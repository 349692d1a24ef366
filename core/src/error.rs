// saga_pipe/src/error.rs

//! Errors the engine itself can observe during a run.
//!
//! None of these are ever returned from `Pipeline::run`: the caller's own error
//! type `E` is the only thing on the failure channel. `SagaError` values describe
//! failures the engine swallowed and are surfaced through the run report.

use anyhow::Error as AnyhowError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SagaError {
  /// A compensating action failed while unwinding. The original failure was still returned.
  #[error("Compensation failed for operation '{operation}'. Source: {source}")]
  CompensationFailed {
    operation: String,
    #[source]
    source: AnyhowError,
  },

  /// A switch selector failed. The entry context was passed through unchanged.
  #[error("Selector failed for switch '{switch}'. Source: {source}")]
  SelectorFailed {
    switch: String,
    #[source]
    source: AnyhowError,
  },
}

impl SagaError {
  /// Name of the operation (or switch) the error belongs to.
  pub fn operation(&self) -> &str {
    match self {
      SagaError::CompensationFailed { operation, .. } => operation,
      SagaError::SelectorFailed { switch, .. } => switch,
    }
  }
}

pub type SagaResult<T, E = SagaError> = std::result::Result<T, E>;
