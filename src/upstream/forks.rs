//! Fork sync
//!
//! Downstream forks track their upstream's mainline. Each fork is cloned into
//! its own transient directory, merged with `upstream/master` and pushed back.
//! Forks run in parallel; a failure (typically a merge conflict) is reported
//! for that fork only.

use crate::core::context::RunContext;
use crate::core::error::RailResult;
use crate::core::fanout::{BatchReport, ItemOutcome, fan_out};
use crate::core::manifest::RepoEntry;
use crate::core::vcs::SystemGit;
use crate::ui::progress::BatchProgress;
use crate::utils;
use std::fmt;
use tracing::info;

pub const MAINLINE: &str = "master";
const UPSTREAM_REMOTE: &str = "upstream";

/// One fork to bring up to date
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForkJob {
  pub name: String,
  pub upstream: String,
  pub downstream: String,
}

impl fmt::Display for ForkJob {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.name)
  }
}

/// Split entries into jobs and skip outcomes
///
/// Entries without an upstream, or whose upstream already is the downstream
/// repository, are skipped.
pub fn plan_forks(entries: &[RepoEntry]) -> (Vec<ForkJob>, Vec<ItemOutcome>) {
  let mut jobs = Vec::new();
  let mut skipped = Vec::new();
  for entry in entries {
    let Some(upstream) = &entry.upstream else {
      info!("Skipping {} :: no upstream", entry.name);
      skipped.push(ItemOutcome::skipped(&entry.name, "no upstream"));
      continue;
    };
    if utils::same_repository(upstream, &entry.downstream) {
      info!("Skipping {} :: {} == {}", entry.name, upstream, entry.downstream);
      skipped.push(ItemOutcome::skipped(&entry.name, "upstream is downstream"));
      continue;
    }
    info!("Adding {} to queue", entry.name);
    jobs.push(ForkJob {
      name: entry.name.clone(),
      upstream: upstream.clone(),
      downstream: entry.downstream.clone(),
    });
  }
  (jobs, skipped)
}

/// Merge upstream mainline into one fork and push it
pub fn sync_fork(ctx: &RunContext, job: &ForkJob) -> RailResult<()> {
  info!("Syncing {} :: {} -> {}", job.name, job.upstream, job.downstream);
  let workdir = ctx.reserve_workdir()?;
  let git = SystemGit::clone_into(&ctx.remote(&job.downstream), workdir.path(), None)?;
  git.configure_identity(&ctx.env.identity)?;
  git.add_remote(UPSTREAM_REMOTE, &utils::resolve_remote(&job.upstream, None))?;
  git.fetch(UPSTREAM_REMOTE)?;
  git.checkout(MAINLINE, false)?;
  git.merge(&format!("{}/{}", UPSTREAM_REMOTE, MAINLINE), false)?;
  git.push("origin", MAINLINE, false)
}

/// Sync every fork on `workers` threads and collect the outcomes
pub fn sync_forks(ctx: &RunContext, entries: &[RepoEntry], workers: usize, dry_run: bool) -> RailResult<BatchReport> {
  let (jobs, mut outcomes) = plan_forks(entries);

  if dry_run {
    outcomes.extend(jobs.iter().map(|j| ItemOutcome::skipped(&j.name, "dry run")));
    return Ok(BatchReport::new(outcomes));
  }

  let progress = BatchProgress::new(jobs.len(), "Syncing forks");
  let results = fan_out(jobs, workers, Some(&progress), |job| sync_fork(ctx, job))?;
  outcomes.extend(results.into_iter().map(|(job, result)| match result {
    Ok(()) => ItemOutcome::done(job.name),
    Err(e) => ItemOutcome::failed(job.name, &e),
  }));
  Ok(BatchReport::new(outcomes))
}
