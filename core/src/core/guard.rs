// saga_pipe/src/core/guard.rs

//! Read-only validation operations.

use async_trait::async_trait;

/// A validation check run against the current context.
///
/// Guards never change the context and never carry a compensation. Returning
/// `Err` stops the pipeline; nothing has to be undone for the guard itself.
#[async_trait]
pub trait Guard<C, E>: Send + Sync
where
  C: Send + Sync + 'static,
{
  async fn check(&self, ctx: &C) -> Result<(), E>;

  /// Name used in tracing fields and run reports.
  fn name(&self) -> &str {
    std::any::type_name::<Self>()
  }
}

type CheckFn<C, E> = Box<dyn Fn(&C) -> Result<(), E> + Send + Sync>;

/// A [`Guard`] backed by a synchronous closure. Built with [`guard_fn`].
pub struct FnGuard<C, E> {
  name: String,
  check: CheckFn<C, E>,
}

/// Wraps a synchronous check closure into a named [`Guard`].
pub fn guard_fn<C, E>(
  name: impl Into<String>,
  check: impl Fn(&C) -> Result<(), E> + Send + Sync + 'static,
) -> FnGuard<C, E> {
  FnGuard {
    name: name.into(),
    check: Box::new(check),
  }
}

#[async_trait]
impl<C, E> Guard<C, E> for FnGuard<C, E>
where
  C: Send + Sync + 'static,
  E: Send + 'static,
{
  async fn check(&self, ctx: &C) -> Result<(), E> {
    (self.check)(ctx)
  }

  fn name(&self) -> &str {
    &self.name
  }
}

impl<C, E> std::fmt::Debug for FnGuard<C, E> {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("FnGuard").field("name", &self.name).finish()
  }
}
