// tests/branch_tests.rs
mod common;

use common::*;
use saga_pipe::{step_fn, Pipeline};

#[tokio::test]
async fn test_branch_predicate_evaluated_once_for_many_operations() {
  setup_tracing();
  let journal = Journal::new();
  let calls = Calls::new();
  let predicate_calls = calls.clone();

  let pipeline = Pipeline::<Account, TestError>::new().branch(
    move |ctx: &Account| {
      predicate_calls.hit();
      ctx.amount > 10
    },
    |p| {
      p.step(recording_step(&journal, "a"))
        .step(recording_step(&journal, "b"))
        .step(recording_step(&journal, "c"))
    },
  );

  let ctx = pipeline
    .run(Account {
      amount: 20,
      ..Default::default()
    })
    .await
    .unwrap();

  assert_eq!(calls.count(), 1);
  assert_eq!(ctx.trail, vec!["a", "b", "c"]);
}

#[tokio::test]
async fn test_branch_predicate_sees_context_at_branch_entry() {
  setup_tracing();
  let journal = Journal::new();

  // The first branch step changes `amount` so the predicate would flip if it were re-evaluated.
  let pipeline = Pipeline::<Account, TestError>::new()
    .step(step_fn("raise", |ctx: &Account| {
      Ok(Account {
        amount: 50,
        ..ctx.clone()
      })
    }))
    .branch(
      |ctx: &Account| ctx.amount > 10,
      |p| {
        p.step(step_fn("reset", |ctx: &Account| {
          Ok(Account {
            amount: 0,
            ..ctx.clone()
          })
        }))
        .step(recording_step(&journal, "after_reset"))
      },
    );

  let ctx = pipeline.run(Account::default()).await.unwrap();

  assert_eq!(ctx.amount, 0);
  assert_eq!(journal.runs(), vec!["after_reset"]);
}

#[tokio::test]
async fn test_false_branch_skips_and_never_compensates() {
  setup_tracing();
  let journal = Journal::new();
  let pipeline = Pipeline::<Account, TestError>::new()
    .step(recording_step(&journal, "before"))
    .branch(|_ctx: &Account| false, |p| {
      p.step(recording_step(&journal, "inside_1"))
        .step(recording_step(&journal, "inside_2"))
    })
    .step(failing_step(&journal, "boom"));

  let (result, report) = pipeline.run_with_report(Account::default()).await;

  assert_eq!(result, Err(TestError::Step("boom".to_string())));
  assert_eq!(journal.runs(), vec!["before", "boom"]);
  assert_eq!(journal.undos(), vec!["before@before"]);
  assert_eq!(report.skipped(), vec!["inside_1", "inside_2"]);
  assert_eq!(report.compensated(), vec!["before"]);
}

#[tokio::test]
async fn test_taken_branch_joins_parent_compensation_order() {
  setup_tracing();
  let journal = Journal::new();
  let pipeline = Pipeline::<Account, TestError>::new()
    .step(recording_step(&journal, "a"))
    .branch(|_ctx: &Account| true, |p| {
      p.step(recording_step(&journal, "b")).step(recording_step(&journal, "c"))
    })
    .step(recording_step(&journal, "d"))
    .step(failing_step(&journal, "boom"));

  let result = pipeline.run(Account::default()).await;

  assert!(result.is_err());
  assert_eq!(journal.undos(), vec!["d@a,b,c,d", "c@a,b,c", "b@a,b", "a@a"]);
}

#[tokio::test]
async fn test_failure_inside_branch_unwinds_branch_and_parent() {
  setup_tracing();
  let journal = Journal::new();
  let pipeline = Pipeline::<Account, TestError>::new()
    .step(recording_step(&journal, "a"))
    .branch(|_ctx: &Account| true, |p| {
      p.step(recording_step(&journal, "b")).step(failing_step(&journal, "c"))
    })
    .step(recording_step(&journal, "never"));

  let result = pipeline.run(Account::default()).await;

  assert_eq!(result, Err(TestError::Step("c".to_string())));
  assert_eq!(journal.undos(), vec!["b@a,b", "a@a"]);
}

#[tokio::test]
async fn test_empty_branch_is_a_no_op() {
  setup_tracing();
  let calls = Calls::new();
  let predicate_calls = calls.clone();
  let base = Pipeline::<Account, TestError>::new().step(step_fn("a", |ctx: &Account| Ok(ctx.clone())));

  let same = base.branch(
    move |_ctx: &Account| {
      predicate_calls.hit();
      true
    },
    |p| p,
  );
  same.run(Account::default()).await.unwrap();

  assert_eq!(same.len(), base.len());
  assert_eq!(calls.count(), 0);
}

#[tokio::test]
async fn test_nested_branches_only_innermost_true() {
  setup_tracing();
  let journal = Journal::new();
  let outer_calls = Calls::new();
  let middle_calls = Calls::new();
  let inner_calls = Calls::new();
  let (oc, mc, ic) = (outer_calls.clone(), middle_calls.clone(), inner_calls.clone());

  // The outer predicate has to hold for the inner ones to be reached at all,
  // so "only innermost" here means only the innermost branch adds steps of its own.
  let pipeline = Pipeline::<Account, TestError>::new()
    .step(recording_step(&journal, "start"))
    .branch(
      move |_ctx: &Account| {
        oc.hit();
        true
      },
      |p| {
        p.branch(
          move |_ctx: &Account| {
            mc.hit();
            true
          },
          |p| {
            p.branch(
              move |_ctx: &Account| {
                ic.hit();
                true
              },
              |p| p.step(recording_step(&journal, "innermost")),
            )
          },
        )
      },
    )
    .step(failing_step(&journal, "boom"));

  let result = pipeline.run(Account::default()).await;

  assert!(result.is_err());
  assert_eq!(journal.runs(), vec!["start", "innermost", "boom"]);
  assert_eq!(journal.undos(), vec!["innermost@start,innermost", "start@start"]);
  assert_eq!((outer_calls.count(), middle_calls.count(), inner_calls.count()), (1, 1, 1));
}

#[tokio::test]
async fn test_nested_branches_with_sibling_steps() {
  setup_tracing();
  let journal = Journal::new();

  // Outer and middle branches hold steps of their own but are false in
  // different places; only the innermost branch (true) contributes.
  let pipeline = Pipeline::<Account, TestError>::new()
    .branch(|_ctx: &Account| false, |p| p.step(recording_step(&journal, "outer_only")))
    .branch(|_ctx: &Account| true, |p| {
      p.branch(|_ctx: &Account| false, |p| p.step(recording_step(&journal, "middle_only")))
        .branch(|_ctx: &Account| true, |p| p.step(recording_step(&journal, "innermost")))
    })
    .step(failing_step(&journal, "boom"));

  let (result, report) = pipeline.run_with_report(Account::default()).await;

  assert!(result.is_err());
  assert_eq!(journal.runs(), vec!["innermost", "boom"]);
  assert_eq!(journal.undos(), vec!["innermost@innermost"]);
  assert_eq!(report.skipped(), vec!["outer_only", "middle_only"]);
}

#[tokio::test]
async fn test_false_outer_branch_never_evaluates_inner_predicate() {
  setup_tracing();
  let journal = Journal::new();
  let inner_calls = Calls::new();
  let ic = inner_calls.clone();

  let pipeline = Pipeline::<Account, TestError>::new().branch(|_ctx: &Account| false, |p| {
    p.branch(
      move |_ctx: &Account| {
        ic.hit();
        true
      },
      |p| p.step(recording_step(&journal, "inner")),
    )
  });

  pipeline.run(Account::default()).await.unwrap();

  assert_eq!(inner_calls.count(), 0);
  assert!(journal.runs().is_empty());
}

#[tokio::test]
async fn test_branch_decision_is_fresh_per_run() {
  setup_tracing();
  let journal = Journal::new();
  let pipeline = Pipeline::<Account, TestError>::new().branch(|ctx: &Account| ctx.amount > 10, |p| {
    p.step(recording_step(&journal, "x")).step(recording_step(&journal, "y"))
  });

  let taken = pipeline
    .run(Account {
      amount: 11,
      ..Default::default()
    })
    .await
    .unwrap();
  let not_taken = pipeline.run(Account::default()).await.unwrap();

  assert_eq!(taken.trail, vec!["x", "y"]);
  assert!(not_taken.trail.is_empty());
}

fn set_amount(amount: u32) -> saga_pipe::FnStep<Account, TestError> {
  step_fn(format!("set_amount_{amount}"), move |ctx: &Account| {
    Ok(Account {
      amount,
      ..ctx.clone()
    })
  })
}

#[tokio::test]
async fn test_reused_fragment_keeps_compensation_of_earlier_occurrence() {
  setup_tracing();
  let journal = Journal::new();
  let fragment = Pipeline::<Account, TestError>::new().branch(|ctx: &Account| ctx.amount > 0, |p| {
    p.step(recording_step(&journal, "a"))
  });

  // The second occurrence re-evaluates the same branch to false after `a` already ran.
  let pipeline = Pipeline::<Account, TestError>::new()
    .step(set_amount(1))
    .branch(|_ctx: &Account| true, |_p| fragment.clone())
    .step(set_amount(0))
    .branch(|_ctx: &Account| true, |_p| fragment.clone())
    .step(failing_step(&journal, "boom"));

  let (result, report) = pipeline.run_with_report(Account::default()).await;

  assert_eq!(result, Err(TestError::Step("boom".to_string())));
  assert_eq!(journal.runs(), vec!["run:a", "run:boom"]);
  assert_eq!(journal.undos(), vec!["undo:a@a"]);
  assert_eq!(report.compensated(), vec!["a"]);
}

#[tokio::test]
async fn test_fragment_appended_twice_compensates_each_occurrence_that_ran() {
  setup_tracing();
  let journal = Journal::new();
  let fragment = Pipeline::<Account, TestError>::new().branch(|ctx: &Account| ctx.amount > 0, |p| {
    p.step(recording_step(&journal, "reserve")).step(recording_step(&journal, "hold"))
  });

  let pipeline = Pipeline::<Account, TestError>::new()
    .step(set_amount(5))
    .branch(|_ctx: &Account| true, |_p| fragment.clone())
    .branch(|_ctx: &Account| true, |_p| fragment.clone())
    .step(failing_step(&journal, "boom"));

  let result = pipeline.run(Account::default()).await;

  assert_eq!(result, Err(TestError::Step("boom".to_string())));
  assert_eq!(
    journal.undos(),
    vec![
      "undo:hold@reserve,hold,reserve,hold",
      "undo:reserve@reserve,hold,reserve",
      "undo:hold@reserve,hold",
      "undo:reserve@reserve",
    ]
  );
}
