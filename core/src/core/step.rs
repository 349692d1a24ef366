// saga_pipe/src/core/step.rs

//! State-mutating operations and their compensations.

use async_trait::async_trait;

/// A state-changing operation within a pipeline.
///
/// `run` receives the current context and must return a *new* context on
/// success. If a later operation fails, `compensate` is called with the context
/// this step produced. The default compensation does nothing.
///
/// A failing compensation is logged and collected in the run report; it never
/// replaces the failure that triggered the unwind.
#[async_trait]
pub trait Step<C, E>: Send + Sync
where
  C: Send + Sync + 'static,
{
  async fn run(&self, ctx: &C) -> Result<C, E>;

  async fn compensate(&self, ctx: &C) -> anyhow::Result<()> {
    let _ = ctx;
    Ok(())
  }

  /// Name used in tracing fields and run reports.
  fn name(&self) -> &str {
    std::any::type_name::<Self>()
  }
}

type RunFn<C, E> = Box<dyn Fn(&C) -> Result<C, E> + Send + Sync>;
type UndoFn<C> = Box<dyn Fn(&C) -> anyhow::Result<()> + Send + Sync>;

/// A [`Step`] backed by synchronous closures. Built with [`step_fn`].
pub struct FnStep<C, E> {
  name: String,
  run: RunFn<C, E>,
  compensate: Option<UndoFn<C>>,
}

/// Wraps a synchronous closure into a named [`Step`] with no compensation.
///
/// Attach one with [`FnStep::compensate_with`].
pub fn step_fn<C, E>(
  name: impl Into<String>,
  run: impl Fn(&C) -> Result<C, E> + Send + Sync + 'static,
) -> FnStep<C, E> {
  FnStep {
    name: name.into(),
    run: Box::new(run),
    compensate: None,
  }
}

impl<C, E> FnStep<C, E> {
  pub fn compensate_with(mut self, undo: impl Fn(&C) -> anyhow::Result<()> + Send + Sync + 'static) -> Self {
    self.compensate = Some(Box::new(undo));
    self
  }
}

#[async_trait]
impl<C, E> Step<C, E> for FnStep<C, E>
where
  C: Send + Sync + 'static,
  E: Send + 'static,
{
  async fn run(&self, ctx: &C) -> Result<C, E> {
    (self.run)(ctx)
  }

  async fn compensate(&self, ctx: &C) -> anyhow::Result<()> {
    match &self.compensate {
      Some(undo) => undo(ctx),
      None => Ok(()),
    }
  }

  fn name(&self) -> &str {
    &self.name
  }
}

// Closures don't implement Debug, so only the shape is shown.
impl<C, E> std::fmt::Debug for FnStep<C, E> {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("FnStep")
      .field("name", &self.name)
      .field("compensate_present", &self.compensate.is_some())
      .finish()
  }
}
