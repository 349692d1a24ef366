// saga_pipe/examples/basic_saga.rs

use saga_pipe::{async_trait, guard_fn, step_fn, Pipeline, Step};
use tracing::info;
use tracing_subscriber::EnvFilter;

// 1. Define the immutable context for the pipeline
#[derive(Clone, Debug, Default)]
struct Signup {
  email: String,
  user_id: Option<u64>,
  welcome_sent: bool,
}

// 2. Define the error type shared by every guard and step
#[derive(Debug, thiserror::Error)]
enum SignupError {
  #[error("invalid email: {0}")]
  InvalidEmail(String),
  #[error("mail server rejected the welcome message")]
  SendFailed,
}

// 3. Steps with real async bodies implement the trait directly
struct SendWelcome {
  fail: bool,
}

#[async_trait]
impl Step<Signup, SignupError> for SendWelcome {
  async fn run(&self, ctx: &Signup) -> Result<Signup, SignupError> {
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    if self.fail {
      return Err(SignupError::SendFailed);
    }
    Ok(Signup {
      welcome_sent: true,
      ..ctx.clone()
    })
  }

  fn name(&self) -> &str {
    "send_welcome"
  }
}

fn signup_pipeline(fail_send: bool) -> Pipeline<Signup, SignupError> {
  Pipeline::named("signup")
    .guard(guard_fn("email_has_at", |ctx: &Signup| {
      if ctx.email.contains('@') {
        Ok(())
      } else {
        Err(SignupError::InvalidEmail(ctx.email.clone()))
      }
    }))
    .step(
      step_fn("assign_user_id", |ctx: &Signup| {
        Ok(Signup {
          user_id: Some(42),
          ..ctx.clone()
        })
      })
      .compensate_with(|ctx: &Signup| {
        info!(user_id = ?ctx.user_id, "Releasing user id.");
        Ok(())
      }),
    )
    .step(SendWelcome { fail: fail_send })
}

#[tokio::main]
async fn main() {
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
    .init();

  info!("--- Basic Saga Example ---");

  let initial = Signup {
    email: "ada@example.com".to_string(),
    ..Default::default()
  };

  match signup_pipeline(false).run(initial.clone()).await {
    Ok(ctx) => info!(email = %ctx.email, user_id = ?ctx.user_id, welcome_sent = ctx.welcome_sent, "Signup completed."),
    Err(e) => info!(error = %e, "Signup failed."),
  }

  // The welcome mail fails: the user id assignment is compensated, the send error is returned.
  match signup_pipeline(true).run(initial).await {
    Ok(ctx) => info!(email = %ctx.email, welcome_sent = ctx.welcome_sent, "Signup completed."),
    Err(e) => info!(error = %e, "Signup failed after compensation."),
  }
}
