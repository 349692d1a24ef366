// saga_pipe/src/core/scope.rs

//! Mutable state that lives for exactly one `Pipeline::run`.

use crate::core::report::{OperationStatus, RunReport};
use crate::error::SagaError;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

static NEXT_BRANCH_ID: AtomicU64 = AtomicU64::new(0);

/// Identifies one materialized branch. Allocated once per `Pipeline::branch` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct BranchId(u64);

impl BranchId {
  pub(crate) fn next() -> Self {
    BranchId(NEXT_BRANCH_ID.fetch_add(1, Ordering::Relaxed))
  }
}

#[derive(Default)]
struct ScopeState {
  branch_flags: Mutex<HashMap<BranchId, bool>>,
  report: Mutex<RunReport>,
}

/// Shared handle to the per-run state, passed to every operation.
///
/// Locks are only taken for the duration of a single read or write and are
/// never held across an `.await`.
#[derive(Clone, Default)]
pub(crate) struct RunScope(Arc<ScopeState>);

impl RunScope {
  pub(crate) fn new() -> Self {
    Self::default()
  }

  pub(crate) fn set_branch_taken(&self, branch: BranchId, taken: bool) {
    self.0.branch_flags.lock().insert(branch, taken);
  }

  /// Cached predicate outcome. A branch whose first record never ran counts as not taken.
  pub(crate) fn branch_taken(&self, branch: BranchId) -> bool {
    self.0.branch_flags.lock().get(&branch).copied().unwrap_or(false)
  }

  pub(crate) fn record(&self, operation: &str, status: OperationStatus) {
    self.0.report.lock().record(operation, status);
  }

  pub(crate) fn suppress(&self, error: SagaError) {
    self.0.report.lock().suppress(error);
  }

  pub(crate) fn take_report(&self) -> RunReport {
    std::mem::take(&mut *self.0.report.lock())
  }
}

impl std::fmt::Debug for RunScope {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("RunScope")
      .field("branches_evaluated", &self.0.branch_flags.lock().len())
      .finish()
  }
}
