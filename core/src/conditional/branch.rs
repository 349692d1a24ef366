// saga_pipe/src/conditional/branch.rs

//! Branches: a run of operations gated by a single predicate evaluation.
//!
//! A branch does not add a node of its own. Its sub-pipeline's records are
//! wrapped and spliced into the parent, so they push onto (and unwind from) the
//! parent's compensation stack like any other step. The first wrapped record
//! evaluates the predicate and caches the outcome in the run scope; the others
//! read that cached outcome. A skipped record never reaches the stack, so a
//! later re-evaluation of the same fragment cannot change what gets unwound.

use crate::core::operation::{ExecuteFn, Executed, Operation};
use crate::core::report::OperationStatus;
use crate::core::scope::{BranchId, RunScope};
use crate::pipeline::Pipeline;
use std::sync::Arc;
use tracing::{event, Level};

pub(crate) type Predicate<C> = Arc<dyn Fn(&C) -> bool + Send + Sync + 'static>;

impl<C, E> Pipeline<C, E>
where
  C: Clone + Send + Sync + 'static,
  E: Send + 'static,
{
  /// Appends the operations built by `build`, executed only when `predicate`
  /// holds for the context reaching the branch.
  ///
  /// `build` is called right away with an empty pipeline. If it adds nothing,
  /// the receiver is returned unchanged. The predicate is evaluated once per
  /// run no matter how many operations the branch holds; when it is false none
  /// of them run and none of their compensations will.
  pub fn branch<P, B>(&self, predicate: P, build: B) -> Self
  where
    P: Fn(&C) -> bool + Send + Sync + 'static,
    B: FnOnce(Pipeline<C, E>) -> Pipeline<C, E>,
  {
    let sub = build(Pipeline::new());
    if sub.is_empty() {
      event!(Level::TRACE, pipeline = %self.name, "Branch built no operations; ignoring.");
      return self.clone();
    }

    let branch = BranchId::next();
    let predicate: Predicate<C> = Arc::new(predicate);
    let wrapped: Vec<Operation<C, E>> = sub
      .ops
      .iter()
      .enumerate()
      .map(|(position, op)| wrap_in_branch(op.clone(), branch, position == 0, predicate.clone()))
      .collect();

    event!(Level::DEBUG, pipeline = %self.name, ?branch, operations = wrapped.len(), "Branch appended.");
    self.appended(wrapped)
  }
}

fn wrap_in_branch<C, E>(inner: Operation<C, E>, branch: BranchId, evaluates: bool, predicate: Predicate<C>) -> Operation<C, E>
where
  C: Clone + Send + Sync + 'static,
  E: Send + 'static,
{
  let inner_execute = inner.execute.clone();
  let name = inner.name.clone();
  let execute: ExecuteFn<C, E> = Arc::new(move |ctx: C, scope: RunScope| {
    let inner_execute = inner_execute.clone();
    let predicate = predicate.clone();
    let name = name.clone();
    Box::pin(async move {
      let taken = if evaluates {
        let taken = predicate(&ctx);
        scope.set_branch_taken(branch, taken);
        event!(Level::DEBUG, ?branch, taken, "Branch predicate evaluated.");
        taken
      } else {
        scope.branch_taken(branch)
      };

      if !taken {
        scope.record(&name, OperationStatus::Skipped);
        return Ok(Executed::Skipped(ctx));
      }
      inner_execute(ctx, scope).await
    })
  });

  Operation {
    name: inner.name,
    kind: inner.kind,
    execute,
    compensate: inner.compensate,
  }
}
