// saga_pipe/src/pipeline/execution.rs

//! Contains `Pipeline::run()` and the forward/unwind loop shared with switches.

use crate::core::operation::{Executed, Operation};
use crate::core::report::RunReport;
use crate::core::scope::RunScope;
use crate::pipeline::compensation::CompensationStack;
use crate::pipeline::definition::Pipeline;
use std::fmt::Display;
use tracing::{event, info_span, instrument, Instrument, Level};

impl<C, E> Pipeline<C, E>
where
  C: Clone + Send + Sync + 'static,
  E: Display + Send + 'static,
{
  /// Runs every operation in order against `initial`.
  ///
  /// Returns the final context if all operations succeed. On the first failure,
  /// the compensations of every step that already succeeded run in reverse
  /// order and that failure is returned unchanged. An empty pipeline returns
  /// `initial` as is.
  #[instrument(
    name = "Pipeline::run",
    skip_all,
    fields(
      pipeline = %self.name,
      context_type = %std::any::type_name::<C>(),
      error_type = %std::any::type_name::<E>(),
      num_operations = self.ops.len(),
    ),
    err(Display)
  )]
  pub async fn run(&self, initial: C) -> Result<C, E> {
    let scope = RunScope::new();
    execute_operations(&self.ops, initial, &scope).await
  }

  /// Same as [`Pipeline::run`], additionally returning what happened to each
  /// operation and every error the engine suppressed along the way.
  #[instrument(
    name = "Pipeline::run_with_report",
    skip_all,
    fields(pipeline = %self.name, num_operations = self.ops.len())
  )]
  pub async fn run_with_report(&self, initial: C) -> (Result<C, E>, RunReport) {
    let scope = RunScope::new();
    let result = execute_operations(&self.ops, initial, &scope).await;
    (result, scope.take_report())
  }
}

/// Forward pass over `ops` with its own compensation stack.
///
/// Used for the top-level pipeline and for a switch's selected case, which is
/// why a failing case is already unwound by the time the switch reports it.
pub(crate) async fn execute_operations<C, E>(ops: &[Operation<C, E>], entry: C, scope: &RunScope) -> Result<C, E>
where
  C: Clone + Send + Sync + 'static,
  E: Display + Send + 'static,
{
  let mut stack = CompensationStack::new();
  let mut current = entry;

  for (index, op) in ops.iter().enumerate() {
    let span = info_span!("operation", index, name = %op.name, kind = %op.kind);
    let outcome = (op.execute)(current, scope.clone()).instrument(span).await;

    match outcome {
      Ok(Executed::Ran(next)) => {
        if let Some(compensate) = &op.compensate {
          stack.push(op.name.clone(), compensate.clone(), next.clone());
        }
        current = next;
      }
      Ok(Executed::Skipped(unchanged)) => current = unchanged,
      Err(e) => {
        event!(
          Level::ERROR,
          operation = %op.name,
          index,
          error = %e,
          compensations_pending = stack.len(),
          "Operation failed; stopping pipeline."
        );
        stack.unwind(scope).await;
        return Err(e);
      }
    }
  }

  event!(Level::DEBUG, "All operations completed.");
  Ok(current)
}
