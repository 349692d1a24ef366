// saga_pipe/src/pipeline/definition.rs

//! Contains the `Pipeline<C, E>` struct and its append-only builder methods.

use crate::core::guard::Guard;
use crate::core::operation::Operation;
use crate::core::step::Step;
use std::sync::Arc;

/// An ordered, immutable sequence of operations over a context `C` with a
/// single error type `E`.
///
/// Builder methods never mutate the receiver: each returns a new pipeline that
/// holds the receiver's operations plus the new ones. Cloning is cheap, and one
/// built pipeline can be run any number of times, concurrently if needed.
pub struct Pipeline<C, E> {
  pub(crate) name: Arc<str>,
  pub(crate) ops: Arc<Vec<Operation<C, E>>>,
}

impl<C, E> Pipeline<C, E>
where
  C: Clone + Send + Sync + 'static,
  E: Send + 'static,
{
  pub fn new() -> Self {
    Self::named("pipeline")
  }

  /// Creates an empty pipeline whose runs are traced under `name`.
  pub fn named(name: impl Into<String>) -> Self {
    Self {
      name: Arc::from(name.into()),
      ops: Arc::new(Vec::new()),
    }
  }

  pub fn name(&self) -> &str {
    &self.name
  }

  /// Number of operation records, counting each branch member and each switch as one.
  pub fn len(&self) -> usize {
    self.ops.len()
  }

  pub fn is_empty(&self) -> bool {
    self.ops.is_empty()
  }

  /// Appends a validation check. Guards never take part in compensation.
  pub fn guard(&self, guard: impl Guard<C, E> + 'static) -> Self {
    self.appended(std::iter::once(Operation::from_guard(Arc::new(guard))))
  }

  /// Appends a state-changing step together with its compensation.
  pub fn step(&self, step: impl Step<C, E> + 'static) -> Self {
    self.appended(std::iter::once(Operation::from_step(Arc::new(step))))
  }

  /// Copy-on-append: the receiver's vector is left untouched.
  pub(crate) fn appended(&self, extra: impl IntoIterator<Item = Operation<C, E>>) -> Self {
    let mut ops: Vec<Operation<C, E>> = self.ops.as_ref().clone();
    ops.extend(extra);
    Self {
      name: self.name.clone(),
      ops: Arc::new(ops),
    }
  }
}

impl<C, E> Default for Pipeline<C, E>
where
  C: Clone + Send + Sync + 'static,
  E: Send + 'static,
{
  fn default() -> Self {
    Self::new()
  }
}

impl<C, E> Clone for Pipeline<C, E> {
  fn clone(&self) -> Self {
    Self {
      name: self.name.clone(),
      ops: Arc::clone(&self.ops),
    }
  }
}

impl<C, E> std::fmt::Debug for Pipeline<C, E> {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Pipeline")
      .field("name", &self.name)
      .field("operations", &self.ops)
      .finish()
  }
}
