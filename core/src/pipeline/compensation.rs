// saga_pipe/src/pipeline/compensation.rs

//! The compensation stack and its best-effort unwind.

use crate::core::operation::CompensateFn;
use crate::core::report::OperationStatus;
use crate::core::scope::RunScope;
use crate::error::{SagaError, SagaResult};
use std::sync::Arc;
use tracing::{event, Level};

struct Entry<C> {
  operation: Arc<str>,
  compensate: CompensateFn<C>,
  /// Context as it stood right after the originating step succeeded.
  snapshot: C,
}

/// LIFO stack of compensations for the steps that have succeeded so far.
pub(crate) struct CompensationStack<C> {
  entries: Vec<Entry<C>>,
}

impl<C> CompensationStack<C>
where
  C: Clone + Send + Sync + 'static,
{
  pub(crate) fn new() -> Self {
    Self { entries: Vec::new() }
  }

  pub(crate) fn push(&mut self, operation: Arc<str>, compensate: CompensateFn<C>, snapshot: C) {
    self.entries.push(Entry {
      operation,
      compensate,
      snapshot,
    });
  }

  pub(crate) fn len(&self) -> usize {
    self.entries.len()
  }

  /// Runs every compensation from the top of the stack down.
  ///
  /// Failures are logged, recorded in the run report and otherwise ignored;
  /// every entry is attempted regardless of earlier failures.
  pub(crate) async fn unwind(mut self, scope: &RunScope) {
    if self.entries.is_empty() {
      return;
    }
    event!(Level::INFO, pending = self.entries.len(), "Unwinding compensations.");

    let mut failures = 0usize;
    while let Some(entry) = self.entries.pop() {
      if let Err(error) = Self::compensate_entry(entry, scope).await {
        failures += 1;
        event!(Level::WARN, operation = %error.operation(), error = %error, "Compensation failed; continuing unwind.");
        scope.record(error.operation(), OperationStatus::CompensationFailed);
        scope.suppress(error);
      }
    }

    event!(Level::INFO, failures, "Unwind finished.");
  }

  async fn compensate_entry(entry: Entry<C>, scope: &RunScope) -> SagaResult<()> {
    event!(Level::DEBUG, operation = %entry.operation, "Running compensation.");
    (entry.compensate)(entry.snapshot, scope.clone())
      .await
      .map_err(|source| SagaError::CompensationFailed {
        operation: entry.operation.to_string(),
        source,
      })
  }
}
