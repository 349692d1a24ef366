// saga_pipe/src/core/report.rs

//! Audit trail of a single pipeline run.

use crate::error::SagaError;

/// What happened to one operation during a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationStatus {
  /// A guard's check passed.
  Passed,
  /// A step ran and produced a new context.
  Succeeded,
  /// The operation belongs to a branch whose predicate was false.
  Skipped,
  /// The operation returned the failure that stopped the run.
  Failed,
  /// The step's compensation ran during unwind.
  Compensated,
  /// The step's compensation failed; the error was suppressed.
  CompensationFailed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportEntry {
  pub operation: String,
  pub status: OperationStatus,
}

/// Ordered record of operation outcomes plus every error the engine swallowed.
///
/// Obtained from `Pipeline::run_with_report`. Entries appear in the order they
/// happened, so forward execution is followed by the unwind (if any).
#[derive(Debug, Default)]
pub struct RunReport {
  entries: Vec<ReportEntry>,
  suppressed: Vec<SagaError>,
}

impl RunReport {
  pub(crate) fn record(&mut self, operation: &str, status: OperationStatus) {
    self.entries.push(ReportEntry {
      operation: operation.to_string(),
      status,
    });
  }

  pub(crate) fn suppress(&mut self, error: SagaError) {
    self.suppressed.push(error);
  }

  pub fn entries(&self) -> &[ReportEntry] {
    &self.entries
  }

  /// Errors raised by compensations or selectors that did not reach the caller.
  pub fn suppressed(&self) -> &[SagaError] {
    &self.suppressed
  }

  pub fn has_suppressed_errors(&self) -> bool {
    !self.suppressed.is_empty()
  }

  /// Names of operations whose compensation ran successfully, in unwind order.
  pub fn compensated(&self) -> Vec<&str> {
    self.names_with(OperationStatus::Compensated)
  }

  pub fn was_compensated(&self, operation: &str) -> bool {
    self
      .entries
      .iter()
      .any(|e| e.status == OperationStatus::Compensated && e.operation == operation)
  }

  /// Names of operations in the order they ran forward (guards and steps).
  pub fn executed(&self) -> Vec<&str> {
    self
      .entries
      .iter()
      .filter(|e| matches!(e.status, OperationStatus::Passed | OperationStatus::Succeeded))
      .map(|e| e.operation.as_str())
      .collect()
  }

  pub fn skipped(&self) -> Vec<&str> {
    self.names_with(OperationStatus::Skipped)
  }

  fn names_with(&self, status: OperationStatus) -> Vec<&str> {
    self
      .entries
      .iter()
      .filter(|e| e.status == status)
      .map(|e| e.operation.as_str())
      .collect()
  }
}
