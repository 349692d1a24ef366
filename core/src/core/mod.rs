pub mod guard;
pub(crate) mod operation;
pub mod report;
pub(crate) mod scope;
pub mod step;

// Re-export key types for easier access from other modules (and lib.rs)
pub use guard::{guard_fn, FnGuard, Guard};
pub use report::{OperationStatus, ReportEntry, RunReport};
pub use step::{step_fn, FnStep, Step};
