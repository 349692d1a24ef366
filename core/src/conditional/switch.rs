// saga_pipe/src/conditional/switch.rs

//! Implements the fluent switch API (`SwitchBuilder`) for exclusive-choice routing
//! on a single selector value.
//!
//! A switch becomes one composite operation in the parent pipeline. At run time
//! it evaluates the selector once, picks the first matching case (or the
//! fallback) and runs that case's operations inline. A failing case is unwound
//! locally before the failure is handed back to the parent, so the parent's
//! compensation stack never holds the case's steps.

use crate::core::operation::{ExecuteFn, Executed, Operation, OperationKind};
use crate::core::scope::RunScope;
use crate::error::SagaError;
use crate::pipeline::execution::execute_operations;
use crate::pipeline::Pipeline;
use std::fmt::Display;
use std::sync::Arc;
use tracing::{event, instrument, Level};

pub(crate) type Selector<C, K> = Arc<dyn Fn(&C) -> anyhow::Result<K> + Send + Sync + 'static>;

type CaseBuilder<'b, C, E> = Box<dyn FnOnce(Pipeline<C, E>) -> Pipeline<C, E> + 'b>;

/// Decides whether a case handles the selector's value.
type Matcher<K> = Box<dyn Fn(&K) -> bool + Send + Sync>;

fn equals<K>(expected: K) -> Matcher<K>
where
  K: PartialEq + Send + Sync + 'static,
{
  Box::new(move |key: &K| *key == expected)
}

struct PendingCase<'b, C, E, K> {
  matcher: Matcher<K>,
  build: CaseBuilder<'b, C, E>,
}

struct Case<C, E, K> {
  matcher: Matcher<K>,
  ops: Vec<Operation<C, E>>,
}

/// Materialized cases plus the optional fallback, shared by every run.
struct Routes<C, E, K> {
  cases: Vec<Case<C, E, K>>,
  fallback: Option<Vec<Operation<C, E>>>,
}

impl<C, E, K> Routes<C, E, K> {
  /// First matching case in insertion order; later matchers are not consulted.
  fn select(&self, key: &K) -> Option<(Option<usize>, &[Operation<C, E>])> {
    match self.cases.iter().position(|case| (case.matcher)(key)) {
      Some(index) => Some((Some(index), self.cases[index].ops.as_slice())),
      None => self.fallback.as_deref().map(|ops| (None, ops)),
    }
  }
}

impl<C, E> Pipeline<C, E>
where
  C: Clone + Send + Sync + 'static,
  E: Display + Send + 'static,
{
  /// Starts a switch on the value returned by `selector`.
  ///
  /// Add cases with [`SwitchBuilder::when`] / [`SwitchBuilder::when_match`] and
  /// finish with [`SwitchBuilder::otherwise`] or [`SwitchBuilder::end`].
  pub fn switch_on<'b, K, S>(&self, selector: S) -> SwitchBuilder<'b, C, E, K>
  where
    K: Send + Sync + 'static,
    S: Fn(&C) -> K + Send + Sync + 'static,
  {
    self.try_switch_on(move |ctx: &C| Ok(selector(ctx)))
  }

  /// Like [`Pipeline::switch_on`] with a fallible selector.
  ///
  /// When the selector returns `Err`, no case runs and the context passes
  /// through unchanged. The error is logged and shows up in the run report;
  /// it does not stop the pipeline.
  pub fn try_switch_on<'b, K, S>(&self, selector: S) -> SwitchBuilder<'b, C, E, K>
  where
    K: Send + Sync + 'static,
    S: Fn(&C) -> anyhow::Result<K> + Send + Sync + 'static,
  {
    SwitchBuilder {
      parent: self.clone(),
      name: String::from("switch"),
      selector: Arc::new(selector),
      cases: Vec::new(),
    }
  }
}

/// Collects the cases of a switch. Case builders run only at finalization.
pub struct SwitchBuilder<'b, C, E, K> {
  parent: Pipeline<C, E>,
  name: String,
  selector: Selector<C, K>,
  cases: Vec<PendingCase<'b, C, E, K>>,
}

impl<'b, C, E, K> SwitchBuilder<'b, C, E, K>
where
  C: Clone + Send + Sync + 'static,
  E: Display + Send + 'static,
  K: Send + Sync + 'static,
{
  /// Names the composite operation in traces and reports. Defaults to `"switch"`.
  pub fn named(mut self, name: impl Into<String>) -> Self {
    self.name = name.into();
    self
  }

  /// Adds a case taken when the selector's value equals `value`.
  pub fn when(mut self, value: K, build: impl FnOnce(Pipeline<C, E>) -> Pipeline<C, E> + 'b) -> Self
  where
    K: PartialEq,
  {
    self.cases.push(PendingCase {
      matcher: equals(value),
      build: Box::new(build),
    });
    self
  }

  /// Adds a case taken when `predicate` holds for the selector's value.
  pub fn when_match(
    mut self,
    predicate: impl Fn(&K) -> bool + Send + Sync + 'static,
    build: impl FnOnce(Pipeline<C, E>) -> Pipeline<C, E> + 'b,
  ) -> Self {
    self.cases.push(PendingCase {
      matcher: Box::new(predicate),
      build: Box::new(build),
    });
    self
  }

  /// Finishes the switch with a fallback used when no case matches.
  pub fn otherwise(self, build: impl FnOnce(Pipeline<C, E>) -> Pipeline<C, E> + 'b) -> Pipeline<C, E> {
    self.finalize(Some(Box::new(build)))
  }

  /// Finishes the switch without a fallback; unmatched values pass the context through.
  pub fn end(self) -> Pipeline<C, E> {
    self.finalize(None)
  }

  #[instrument(
    name = "SwitchBuilder::finalize",
    skip_all,
    fields(switch = %self.name, num_cases = self.cases.len(), has_fallback = fallback.is_some())
  )]
  fn finalize(self, fallback: Option<CaseBuilder<'b, C, E>>) -> Pipeline<C, E> {
    let cases = self
      .cases
      .into_iter()
      .map(|pending| Case {
        matcher: pending.matcher,
        ops: materialize(pending.build),
      })
      .collect();
    let routes = Arc::new(Routes {
      cases,
      fallback: fallback.map(materialize),
    });

    let name: Arc<str> = Arc::from(self.name);
    let op = Operation {
      name: name.clone(),
      kind: OperationKind::Switch,
      execute: dispatcher(name, self.selector, routes),
      // Case steps are unwound inside the dispatcher; nothing is left for the parent.
      compensate: None,
    };

    event!(Level::DEBUG, "Switch materialized.");
    self.parent.appended(std::iter::once(op))
  }
}

fn materialize<C, E>(build: Box<dyn FnOnce(Pipeline<C, E>) -> Pipeline<C, E> + '_>) -> Vec<Operation<C, E>>
where
  C: Clone + Send + Sync + 'static,
  E: Send + 'static,
{
  build(Pipeline::new()).ops.as_ref().clone()
}

fn dispatcher<C, E, K>(name: Arc<str>, selector: Selector<C, K>, routes: Arc<Routes<C, E, K>>) -> ExecuteFn<C, E>
where
  C: Clone + Send + Sync + 'static,
  E: Display + Send + 'static,
  K: Send + Sync + 'static,
{
  Arc::new(move |ctx: C, scope: RunScope| {
    let selector = selector.clone();
    let routes = routes.clone();
    let name = name.clone();
    Box::pin(async move {
      let key = match selector(&ctx) {
        Ok(key) => key,
        Err(source) => {
          event!(Level::WARN, switch = %name, error = %source, "Selector failed; passing context through unchanged.");
          scope.suppress(SagaError::SelectorFailed {
            switch: name.to_string(),
            source,
          });
          return Ok(Executed::Ran(ctx));
        }
      };

      let Some((case, ops)) = routes.select(&key) else {
        event!(Level::DEBUG, switch = %name, "No case matched and no fallback; passing context through.");
        return Ok(Executed::Ran(ctx));
      };
      drop(key);

      match case {
        Some(index) => event!(Level::DEBUG, switch = %name, case = index, operations = ops.len(), "Case selected."),
        None => event!(Level::DEBUG, switch = %name, operations = ops.len(), "Fallback selected."),
      }
      execute_operations(ops, ctx, &scope).await.map(Executed::Ran)
    })
  })
}
