// tests/common/mod.rs
#![allow(dead_code)] // Allow unused code in this common test module

use parking_lot::Mutex;
use saga_pipe::{async_trait, step_fn, FnStep, Step};
use std::sync::{
  atomic::{AtomicUsize, Ordering},
  Arc,
};
use std::time::Duration;
use tracing::Level;

// --- Common Context Structs ---
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Account {
  pub email: String,
  pub user_id: Option<u64>,
  pub status: String,
  pub amount: u32,
  pub trail: Vec<String>,
}

impl Account {
  pub fn with_email(email: &str) -> Self {
    Self {
      email: email.to_string(),
      ..Default::default()
    }
  }

  pub fn with_status(status: &str) -> Self {
    Self {
      status: status.to_string(),
      ..Default::default()
    }
  }

  pub fn tracing(mut self, entry: &str) -> Self {
    self.trail.push(entry.to_string());
    self
  }
}

// --- Common Error Type for Tests ---
#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum TestError {
  #[error("invalid email")]
  InvalidEmail,

  #[error("send failed")]
  SendFailed,

  #[error("step '{0}' failed")]
  Step(String),
}

// --- Journal of run / undo events shared between a test and its steps ---
#[derive(Clone, Default)]
pub struct Journal(Arc<Mutex<Vec<String>>>);

impl Journal {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn push(&self, entry: impl Into<String>) {
    self.0.lock().push(entry.into());
  }

  pub fn entries(&self) -> Vec<String> {
    self.0.lock().clone()
  }

  pub fn runs(&self) -> Vec<String> {
    self.with_prefix("run:")
  }

  pub fn undos(&self) -> Vec<String> {
    self.with_prefix("undo:")
  }

  fn with_prefix(&self, prefix: &str) -> Vec<String> {
    self
      .0
      .lock()
      .iter()
      .filter_map(|e| e.strip_prefix(prefix).map(str::to_string))
      .collect()
  }
}

// --- Shared call counter for predicates / selectors / matchers ---
#[derive(Clone, Default)]
pub struct Calls(Arc<AtomicUsize>);

impl Calls {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn hit(&self) {
    self.0.fetch_add(1, Ordering::SeqCst);
  }

  pub fn count(&self) -> usize {
    self.0.load(Ordering::SeqCst)
  }
}

// --- Common Step Creators ---

/// Appends `name` to the trail. Its compensation records the trail it was handed,
/// e.g. `undo:b@a,b`, so tests can check which snapshot a compensation saw.
pub fn recording_step(journal: &Journal, name: &'static str) -> FnStep<Account, TestError> {
  let run_journal = journal.clone();
  let undo_journal = journal.clone();
  step_fn(name, move |ctx: &Account| {
    run_journal.push(format!("run:{name}"));
    Ok(ctx.clone().tracing(name))
  })
  .compensate_with(move |ctx: &Account| {
    undo_journal.push(format!("undo:{name}@{}", ctx.trail.join(",")));
    Ok(())
  })
}

pub fn failing_step(journal: &Journal, name: &'static str) -> FnStep<Account, TestError> {
  let run_journal = journal.clone();
  let undo_journal = journal.clone();
  step_fn(name, move |_ctx: &Account| {
    run_journal.push(format!("run:{name}"));
    Err(TestError::Step(name.to_string()))
  })
  .compensate_with(move |_ctx: &Account| {
    undo_journal.push(format!("undo:{name}"));
    Ok(())
  })
}

/// A step whose compensation always fails after journaling the attempt.
pub fn step_with_failing_undo(journal: &Journal, name: &'static str) -> FnStep<Account, TestError> {
  let run_journal = journal.clone();
  let undo_journal = journal.clone();
  step_fn(name, move |ctx: &Account| {
    run_journal.push(format!("run:{name}"));
    Ok(ctx.clone().tracing(name))
  })
  .compensate_with(move |_ctx: &Account| {
    undo_journal.push(format!("undo:{name}"));
    Err(anyhow::anyhow!("undo of {name} exploded"))
  })
}

/// Asynchronous step that yields to the runtime before producing its context.
pub struct DelayedStep {
  pub name: &'static str,
  pub delay: Duration,
  pub journal: Journal,
}

#[async_trait]
impl Step<Account, TestError> for DelayedStep {
  async fn run(&self, ctx: &Account) -> Result<Account, TestError> {
    tokio::time::sleep(self.delay).await;
    self.journal.push(format!("run:{}", self.name));
    Ok(ctx.clone().tracing(self.name))
  }

  async fn compensate(&self, ctx: &Account) -> anyhow::Result<()> {
    tokio::time::sleep(self.delay).await;
    self.journal.push(format!("undo:{}@{}", self.name, ctx.trail.join(",")));
    Ok(())
  }

  fn name(&self) -> &str {
    self.name
  }
}

// --- Helper for Tracing Setup (call once per test run if needed) ---
use once_cell::sync::Lazy;
static TRACING_INIT: Lazy<()> = Lazy::new(|| {
  tracing_subscriber::fmt()
    .with_max_level(Level::DEBUG)
    .with_test_writer() // Important for tests to capture output
    .try_init()
    .ok(); // Allow multiple initializations in tests (ok if fails)
});

pub fn setup_tracing() {
  Lazy::force(&TRACING_INIT);
}
