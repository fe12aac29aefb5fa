//! Snap and deb version branches
//!
//! Packaging repositories keep one branch per upstream release: snaps per
//! full version (`1.19.3`), debs per release series (`1.19`). Missing branches
//! are cut from `origin/master`.

use crate::core::context::RunContext;
use crate::core::error::RailResult;
use crate::core::fanout::{BatchReport, ItemOutcome};
use crate::core::manifest::{RepoEntry, TagFilter};
use crate::core::vcs::{RefKind, RemoteRef, SystemGit};
use crate::upstream::forks::MAINLINE;
use crate::upstream::tags::parse_tag_version;
use crate::utils;
use semver::Version;
use std::collections::BTreeSet;
use std::fmt;
use tracing::info;

pub const DEFAULT_VERSION_SOURCE: &str = "https://github.com/kubernetes/kubernetes";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackageKind {
  Snap,
  Deb,
}

impl PackageKind {
  /// Branch tracking `version`
  pub fn branch_for(&self, version: &Version) -> String {
    match self {
      PackageKind::Snap => format!("{}.{}.{}", version.major, version.minor, version.patch),
      PackageKind::Deb => format!("{}.{}", version.major, version.minor),
    }
  }
}

impl fmt::Display for PackageKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      PackageKind::Snap => write!(f, "snap"),
      PackageKind::Deb => write!(f, "deb"),
    }
  }
}

/// Branches implied by upstream release tags `>= start` that downstream
/// lacks, oldest first; prereleases never get a branch
pub fn missing_branches(
  kind: PackageKind,
  upstream_tags: &[RemoteRef],
  downstream_heads: &[RemoteRef],
  start: &Version,
) -> Vec<String> {
  let present: BTreeSet<&str> = downstream_heads.iter().map(|r| r.name.as_str()).collect();
  let versions: BTreeSet<Version> = upstream_tags
    .iter()
    .filter_map(|r| parse_tag_version(&r.name))
    .filter(|v| v.pre.is_empty() && v >= start)
    .collect();

  let mut seen = BTreeSet::new();
  versions
    .iter()
    .map(|v| kind.branch_for(v))
    .filter(|b| !present.contains(b.as_str()) && seen.insert(b.clone()))
    .collect()
}

/// Create and push the missing branches of one packaging repository
///
/// Returns the branches created.
pub fn sync_package(
  ctx: &RunContext,
  entry: &RepoEntry,
  kind: PackageKind,
  version_source: &str,
  start: &Version,
  dry_run: bool,
) -> RailResult<Vec<String>> {
  let downstream_url = ctx.remote(&entry.downstream);
  let branches = missing_branches(
    kind,
    &SystemGit::ls_remote(&utils::resolve_remote(version_source, None), RefKind::Tags)?,
    &SystemGit::ls_remote(&downstream_url, RefKind::Heads)?,
    start,
  );
  if branches.is_empty() {
    info!("{} {} :: all branches present", kind, entry.name);
    return Ok(branches);
  }
  if dry_run {
    info!("{} {} :: would create {}", kind, entry.name, branches.join(", "));
    return Ok(branches);
  }

  let workdir = ctx.reserve_workdir()?;
  let git = SystemGit::clone_into(&downstream_url, workdir.path(), None)?;
  let start_point = format!("origin/{}", MAINLINE);
  for branch in &branches {
    info!("{} {} :: creating branch {}", kind, entry.name, branch);
    git.create_branch(branch, &start_point)?;
    git.push("origin", &format!("refs/heads/{}", branch), false)?;
  }
  Ok(branches)
}

/// Sync every packaging repository passing `filter`
///
/// The version source is the entry's `upstream` when set, `default_source`
/// otherwise. A failing repository is reported and the batch continues.
pub fn sync_packages(
  ctx: &RunContext,
  entries: &[RepoEntry],
  kind: PackageKind,
  default_source: &str,
  start: &Version,
  filter: &TagFilter,
  dry_run: bool,
) -> BatchReport {
  let mut outcomes = Vec::new();
  for entry in entries.iter().filter(|e| filter.matches(&e.tags)) {
    let source = entry.upstream.as_deref().unwrap_or(default_source);
    outcomes.push(match sync_package(ctx, entry, kind, source, start, dry_run) {
      Ok(branches) if branches.is_empty() => ItemOutcome::skipped(&entry.name, "up to date"),
      Ok(_) if dry_run => ItemOutcome::skipped(&entry.name, "dry run"),
      Ok(_) => ItemOutcome::done(&entry.name),
      Err(e) => {
        tracing::error!("Failed {}: {}", entry.name, e);
        ItemOutcome::failed(&entry.name, &e)
      }
    });
  }
  BatchReport::new(outcomes)
}
