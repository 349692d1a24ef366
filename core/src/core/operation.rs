// saga_pipe/src/core/operation.rs

//! The operation record: a forward action paired with an optional compensation.
//!
//! Every guard, step, branch member and switch ends up as an `Operation` in a
//! pipeline's sequence. The engine only ever sees this erased shape.

use crate::core::guard::Guard;
use crate::core::report::OperationStatus;
use crate::core::scope::RunScope;
use crate::core::step::Step;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

pub(crate) type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Forward action: consumes the current context, yields the next one or a failure.
pub(crate) type ExecuteFn<C, E> = Arc<dyn Fn(C, RunScope) -> BoxFuture<'static, Result<Executed<C>, E>> + Send + Sync>;

/// Compensating action, called with the context captured after the forward action succeeded.
pub(crate) type CompensateFn<C> = Arc<dyn Fn(C, RunScope) -> BoxFuture<'static, anyhow::Result<()>> + Send + Sync>;

/// What a forward action did with the context it was handed.
///
/// Only `Ran` puts the record's compensation on the stack, so the decision is
/// fixed at the moment the record executes.
#[derive(Debug)]
pub(crate) enum Executed<C> {
  Ran(C),
  /// Gated off by an enclosing branch; the context is returned untouched.
  Skipped(C),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum OperationKind {
  Guard,
  Step,
  Switch,
}

impl std::fmt::Display for OperationKind {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    let label = match self {
      OperationKind::Guard => "guard",
      OperationKind::Step => "step",
      OperationKind::Switch => "switch",
    };
    f.write_str(label)
  }
}

pub(crate) struct Operation<C, E> {
  pub(crate) name: Arc<str>,
  pub(crate) kind: OperationKind,
  pub(crate) execute: ExecuteFn<C, E>,
  pub(crate) compensate: Option<CompensateFn<C>>,
}

// Manual impl: derive would demand C: Clone + E: Clone for no reason.
impl<C, E> Clone for Operation<C, E> {
  fn clone(&self) -> Self {
    Self {
      name: self.name.clone(),
      kind: self.kind,
      execute: self.execute.clone(),
      compensate: self.compensate.clone(),
    }
  }
}

impl<C, E> std::fmt::Debug for Operation<C, E> {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Operation")
      .field("name", &self.name)
      .field("kind", &self.kind)
      .field("compensate_present", &self.compensate.is_some())
      .finish()
  }
}

impl<C, E> Operation<C, E>
where
  C: Clone + Send + Sync + 'static,
  E: Send + 'static,
{
  /// Guard record: passes the context through untouched on success. No compensation.
  pub(crate) fn from_guard(guard: Arc<dyn Guard<C, E>>) -> Self {
    let name: Arc<str> = Arc::from(guard.name());
    let op_name = name.clone();

    let execute: ExecuteFn<C, E> = Arc::new(move |ctx: C, scope: RunScope| {
      let guard = guard.clone();
      let name = op_name.clone();
      Box::pin(async move {
        match guard.check(&ctx).await {
          Ok(()) => {
            scope.record(&name, OperationStatus::Passed);
            Ok(Executed::Ran(ctx))
          }
          Err(e) => {
            scope.record(&name, OperationStatus::Failed);
            Err(e)
          }
        }
      })
    });

    Self {
      name,
      kind: OperationKind::Guard,
      execute,
      compensate: None,
    }
  }

  /// Step record: `run` is the forward action, `compensate` always present
  /// (it is a no-op unless the step overrides it).
  pub(crate) fn from_step(step: Arc<dyn Step<C, E>>) -> Self {
    let name: Arc<str> = Arc::from(step.name());

    let run_step = step.clone();
    let run_name = name.clone();
    let execute: ExecuteFn<C, E> = Arc::new(move |ctx: C, scope: RunScope| {
      let step = run_step.clone();
      let name = run_name.clone();
      Box::pin(async move {
        match step.run(&ctx).await {
          Ok(next) => {
            scope.record(&name, OperationStatus::Succeeded);
            Ok(Executed::Ran(next))
          }
          Err(e) => {
            scope.record(&name, OperationStatus::Failed);
            Err(e)
          }
        }
      })
    });

    let undo_name = name.clone();
    let compensate: CompensateFn<C> = Arc::new(move |ctx: C, scope: RunScope| {
      let step = step.clone();
      let name = undo_name.clone();
      Box::pin(async move {
        let outcome = step.compensate(&ctx).await;
        if outcome.is_ok() {
          scope.record(&name, OperationStatus::Compensated);
        }
        outcome
      })
    });

    Self {
      name,
      kind: OperationKind::Step,
      execute,
      compensate: Some(compensate),
    }
  }
}
