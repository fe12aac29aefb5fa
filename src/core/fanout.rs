//! Bounded parallel fan-out with collected per-item outcomes
//!
//! Items run on a dedicated rayon pool. A failing item is logged and recorded;
//! it never cancels its siblings. The caller gets one outcome per item and
//! decides what a failure means.

use crate::core::error::{RailError, RailResult};
use crate::ui::progress::BatchProgress;
use rayon::prelude::*;
use serde::Serialize;
use tracing::error;

/// What happened to one batch item
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
  Done,
  Skipped { reason: String },
  Failed { error: String },
}

/// Outcome of one named item
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemOutcome {
  pub item: String,
  #[serde(flatten)]
  pub outcome: Outcome,
}

impl ItemOutcome {
  pub fn done(item: impl Into<String>) -> Self {
    Self {
      item: item.into(),
      outcome: Outcome::Done,
    }
  }

  pub fn skipped(item: impl Into<String>, reason: impl Into<String>) -> Self {
    Self {
      item: item.into(),
      outcome: Outcome::Skipped { reason: reason.into() },
    }
  }

  pub fn failed(item: impl Into<String>, error: &RailError) -> Self {
    Self {
      item: item.into(),
      outcome: Outcome::Failed {
        error: error.to_string(),
      },
    }
  }

  pub fn is_failed(&self) -> bool {
    matches!(self.outcome, Outcome::Failed { .. })
  }
}

/// Collected outcomes of a batch command
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchReport {
  pub outcomes: Vec<ItemOutcome>,
}

impl BatchReport {
  pub fn new(outcomes: Vec<ItemOutcome>) -> Self {
    Self { outcomes }
  }

  pub fn failed(&self) -> usize {
    self.outcomes.iter().filter(|o| o.is_failed()).count()
  }

  pub fn all_ok(&self) -> bool {
    self.failed() == 0
  }

  /// Print the report (`--json` or a short human summary)
  pub fn print(&self, json: bool) -> RailResult<()> {
    if json {
      println!("{}", serde_json::to_string_pretty(self)?);
      return Ok(());
    }
    let skipped = self
      .outcomes
      .iter()
      .filter(|o| matches!(o.outcome, Outcome::Skipped { .. }))
      .count();
    println!(
      "\n{} item(s): {} done, {} skipped, {} failed",
      self.outcomes.len(),
      self.outcomes.len() - skipped - self.failed(),
      skipped,
      self.failed()
    );
    for o in self.outcomes.iter().filter(|o| o.is_failed()) {
      if let Outcome::Failed { error } = &o.outcome {
        println!("   ❌ {}: {}", o.item, error.lines().next().unwrap_or_default());
      }
    }
    Ok(())
  }

  /// Under `--strict`, turn failed items into a validation error
  pub fn check(&self, strict: bool) -> RailResult<()> {
    if strict && !self.all_ok() {
      return Err(RailError::BatchFailed {
        failed: self.failed(),
        total: self.outcomes.len(),
      });
    }
    Ok(())
  }
}

/// Default pool size: available processing units
pub fn default_workers() -> usize {
  std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1)
}

/// Run `op` over every item on a pool of `workers` threads
///
/// Returns only after every item finished. Results come back in input order,
/// each paired with its item.
pub fn fan_out<I, T, F>(
  items: Vec<I>,
  workers: usize,
  progress: Option<&BatchProgress>,
  op: F,
) -> RailResult<Vec<(I, RailResult<T>)>>
where
  I: Send + std::fmt::Display,
  T: Send,
  F: Fn(&I) -> RailResult<T> + Sync,
{
  let pool = rayon::ThreadPoolBuilder::new()
    .num_threads(workers.max(1))
    .build()
    .map_err(|e| RailError::message(format!("Failed to start worker pool: {}", e)))?;

  let results = pool.install(|| {
    items
      .into_par_iter()
      .map(|item| {
        let result = op(&item);
        if let Err(ref e) = result {
          error!("Failed {}: {}", item, e);
        }
        if let Some(p) = progress {
          p.inc();
        }
        (item, result)
      })
      .collect()
  });

  Ok(results)
}
