// saga_pipe/examples/error_handling.rs

use saga_pipe::{step_fn, Pipeline, SagaError};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Clone, Debug, Default)]
struct Transfer {
  debited: bool,
  credited: bool,
}

#[derive(Debug, thiserror::Error)]
enum TransferError {
  #[error("ledger unavailable")]
  LedgerUnavailable,
}

#[tokio::main]
async fn main() {
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
    .init();

  info!("--- Error Handling Example ---");

  let pipeline = Pipeline::<Transfer, TransferError>::named("transfer")
    .step(
      step_fn("debit_source", |ctx: &Transfer| {
        Ok(Transfer {
          debited: true,
          ..ctx.clone()
        })
      })
      // A failing compensation is logged and reported, never returned.
      .compensate_with(|ctx: &Transfer| {
        info!(debited = ctx.debited, "Refunding source account.");
        Err(anyhow::anyhow!("refund queue is full"))
      }),
    )
    .step(
      step_fn("credit_target", |ctx: &Transfer| {
        Ok(Transfer {
          credited: true,
          ..ctx.clone()
        })
      })
      .compensate_with(|ctx: &Transfer| {
        info!(credited = ctx.credited, "Reversing credit.");
        Ok(())
      }),
    )
    .step(step_fn("record_in_ledger", |_ctx: &Transfer| Err(TransferError::LedgerUnavailable)));

  let (result, report) = pipeline.run_with_report(Transfer::default()).await;

  match result {
    Ok(ctx) => info!(debited = ctx.debited, credited = ctx.credited, "Transfer completed."),
    Err(e) => info!(error = %e, compensated = ?report.compensated(), "Transfer failed."),
  }

  for suppressed in report.suppressed() {
    match suppressed {
      SagaError::CompensationFailed { operation, source } => {
        warn!(%operation, error = %source, "Needs manual follow-up.")
      }
      SagaError::SelectorFailed { switch, source } => warn!(%switch, error = %source, "Routing was skipped."),
    }
  }
}
