//! Stable branch release and tagging
//!
//! `cut_stable` merges each repository's `master` into `stable` with an
//! explicit merge commit. `tag_stable` marks every `stable` branch with the
//! bundle revision it shipped in.

use crate::core::context::RunContext;
use crate::core::error::RailResult;
use crate::core::fanout::{BatchReport, ItemOutcome};
use crate::core::manifest::{RepoEntry, TagFilter};
use crate::core::vcs::SystemGit;
use crate::upstream::forks::MAINLINE;
use tracing::{info, warn};

pub const STABLE: &str = "stable";

/// Result of merging mainline into stable for one repository
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StableMerge {
  Merged,
  /// `master` and `stable` already point at the same commit
  UpToDate,
}

/// Tag marking a stable branch: `{version}+{rev}` for bugfix releases,
/// `ck-{version}-{rev}` otherwise
pub fn stable_tag_name(version: &str, bundle_revision: &str, bugfix: bool) -> String {
  if bugfix {
    format!("{}+{}", version, bundle_revision)
  } else {
    format!("ck-{}-{}", version, bundle_revision)
  }
}

/// Merge `origin/master` into `stable` and push, unless they already match
pub fn cut_stable_one(ctx: &RunContext, entry: &RepoEntry) -> RailResult<StableMerge> {
  let workdir = ctx.reserve_workdir()?;
  let git = SystemGit::clone_into(&ctx.remote(&entry.downstream), workdir.path(), None)?;

  let mainline = git.rev_parse(&format!("origin/{}", MAINLINE))?;
  let stable = git.rev_parse(&format!("origin/{}", STABLE))?;
  if mainline == stable {
    info!("Skipping  :: {:^35} :: master == stable", entry.name);
    return Ok(StableMerge::UpToDate);
  }

  git.configure_identity(&ctx.env.identity)?;
  git.checkout(STABLE, true)?;
  git.merge(&format!("origin/{}", MAINLINE), true)?;
  git.push("origin", STABLE, false)?;
  Ok(StableMerge::Merged)
}

/// Release every entry needing a stable branch, in order
///
/// A failed clone, merge or push aborts the run.
pub fn cut_stable(ctx: &RunContext, entries: &[RepoEntry], filter: &TagFilter, dry_run: bool) -> RailResult<BatchReport> {
  let mut outcomes = Vec::new();
  for entry in entries.iter().filter(|e| filter.matches(&e.tags)) {
    if !entry.needs_stable {
      outcomes.push(ItemOutcome::skipped(&entry.name, "does not require stable"));
      continue;
    }
    info!("Releasing :: {:^35} :: from: {} to: {}", entry.name, MAINLINE, STABLE);
    if dry_run {
      outcomes.push(ItemOutcome::skipped(&entry.name, "dry run"));
      continue;
    }
    outcomes.push(match cut_stable_one(ctx, entry)? {
      StableMerge::Merged => ItemOutcome::done(&entry.name),
      StableMerge::UpToDate => ItemOutcome::skipped(&entry.name, "master == stable"),
    });
  }
  Ok(BatchReport::new(outcomes))
}

/// Force `tag` onto the tip of `stable` and force-push it
pub fn tag_stable_one(ctx: &RunContext, entry: &RepoEntry, tag: &str) -> RailResult<()> {
  let workdir = ctx.reserve_workdir()?;
  let git = SystemGit::clone_into(&ctx.remote(&entry.downstream), workdir.path(), None)?;
  git.configure_identity(&ctx.env.identity)?;
  git.checkout(STABLE, false)?;
  git.tag(tag, true)?;
  git.push("origin", tag, true)
}

/// Tag every entry needing it; failures are recorded and the batch continues
pub fn tag_stable(
  ctx: &RunContext,
  entries: &[RepoEntry],
  filter: &TagFilter,
  tag: &str,
  dry_run: bool,
) -> BatchReport {
  let mut outcomes = Vec::new();
  for entry in entries.iter().filter(|e| filter.matches(&e.tags)) {
    if !entry.needs_tagging {
      info!("Skipping {} :: does not require tagging", entry.name);
      outcomes.push(ItemOutcome::skipped(&entry.name, "does not require tagging"));
      continue;
    }
    info!("Tagging {} ({}) :: {}", entry.name, tag, entry.downstream);
    if dry_run {
      outcomes.push(ItemOutcome::skipped(&entry.name, "dry run"));
      continue;
    }
    match tag_stable_one(ctx, entry, tag) {
      Ok(()) => outcomes.push(ItemOutcome::done(&entry.name)),
      Err(e) => {
        warn!("Problem tagging {}: {}, will skip for now", entry.name, e);
        outcomes.push(ItemOutcome::failed(&entry.name, &e));
      }
    }
  }
  BatchReport::new(outcomes)
}
