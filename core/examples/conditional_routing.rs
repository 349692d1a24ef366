// saga_pipe/examples/conditional_routing.rs

use saga_pipe::{step_fn, Pipeline};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Clone, Debug, PartialEq, Eq)]
enum Status {
  Draft,
  Approved,
  Rejected,
}

#[derive(Clone, Debug)]
struct Order {
  status: Status,
  total_cents: u64,
  actions: Vec<&'static str>,
}

impl Order {
  fn did(&self, action: &'static str) -> Self {
    let mut next = self.clone();
    next.actions.push(action);
    next
  }
}

#[derive(Debug, thiserror::Error)]
#[error("order processing failed: {0}")]
struct OrderError(String);

fn action(name: &'static str) -> saga_pipe::FnStep<Order, OrderError> {
  step_fn(name, move |ctx: &Order| Ok(ctx.did(name))).compensate_with(move |_ctx: &Order| {
    info!(action = name, "Undoing.");
    Ok(())
  })
}

fn order_pipeline() -> Pipeline<Order, OrderError> {
  Pipeline::named("orders")
    .step(action("load_order"))
    .switch_on(|ctx: &Order| ctx.status.clone())
    .named("route_by_status")
    .when(Status::Draft, |p| p.step(action("notify_author")))
    .when(Status::Approved, |p| {
      p.step(action("reserve_stock"))
        .branch(|ctx: &Order| ctx.total_cents > 10_000, |p| {
          p.step(action("fraud_check")).step(action("manager_sign_off"))
        })
        .step(action("charge_card"))
    })
    .otherwise(|p| p.step(action("archive")))
}

#[tokio::main]
async fn main() {
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
    .init();

  info!("--- Conditional Routing Example ---");
  let pipeline = order_pipeline();

  let orders = [
    (Status::Draft, 1_000),
    (Status::Approved, 2_000),
    (Status::Approved, 50_000),
    (Status::Rejected, 1_000),
  ];

  for (status, total_cents) in orders {
    let order = Order {
      status,
      total_cents,
      actions: Vec::new(),
    };
    let (result, report) = pipeline.run_with_report(order).await;
    match result {
      Ok(done) => info!(actions = ?done.actions, skipped = ?report.skipped(), "Order processed."),
      Err(e) => info!(error = %e, "Order failed."),
    }
  }
}
