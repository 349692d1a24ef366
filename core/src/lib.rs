// saga_pipe/src/lib.rs

//! saga-pipe: an ASYNC saga pipeline for Rust.
//!
//! A pipeline threads an immutable context through an ordered list of
//! operations and stops at the first failure:
//!  - Guards validate the context and never change it.
//!  - Steps produce a new context and may declare a compensating action.
//!  - When an operation fails, the compensations of the steps that already
//!    succeeded run in reverse order (best effort) and the failure is returned.
//!  - Branches gate a run of operations on a single predicate evaluation.
//!  - Switches route to at most one case based on a selector value.
//!
//! Pipelines are immutable values: every builder call returns a new one, and a
//! built pipeline can be run any number of times.

pub mod conditional;
pub mod core;
pub mod error;
pub mod pipeline;

// --- Re-exports for the Public API ---

// The operation contracts implemented by applications
pub use crate::core::guard::{guard_fn, FnGuard, Guard};
pub use crate::core::step::{step_fn, FnStep, Step};

// Run reporting
pub use crate::core::report::{OperationStatus, ReportEntry, RunReport};

// The main Pipeline struct and the builder for switches
pub use crate::conditional::switch::SwitchBuilder;
pub use crate::pipeline::definition::Pipeline;

pub use crate::error::{SagaError, SagaResult};

// Lets implementors write `#[saga_pipe::async_trait]` without a direct dependency.
pub use async_trait::async_trait;

/*
    Core Workflow:
    1. Define an immutable context struct `MyCtx` (Clone) and an error type `MyErr` (Display).
    2. Implement `Guard<MyCtx, MyErr>` / `Step<MyCtx, MyErr>`, or use `guard_fn` / `step_fn`.
    3. Build: `Pipeline::named("checkout").guard(..).step(..).branch(pred, |p| p.step(..))`.
    4. Route with `.switch_on(|ctx| ctx.kind).when(Kind::A, |p| p.step(..)).end()`.
    5. `pipeline.run(ctx).await` returns `Ok(final_ctx)` or the first `Err`, after
       compensations have been attempted.
*/
