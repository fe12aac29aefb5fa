//! Upstream tag propagation
//!
//! Release tags published upstream are copied to the downstream mirror. Only
//! semver tags at or above a starting version are considered.

use crate::core::context::RunContext;
use crate::core::error::RailResult;
use crate::core::fanout::{BatchReport, ItemOutcome};
use crate::core::vcs::{RefKind, RemoteRef, SystemGit};
use crate::utils;
use semver::Version;
use std::collections::BTreeSet;
use tracing::info;

pub const DEFAULT_STARTING_SEMVER: &str = "1.14.0";

/// Parse `v1.19.3` / `1.19.3` tag names
pub fn parse_tag_version(name: &str) -> Option<Version> {
  Version::parse(name.strip_prefix('v').unwrap_or(name)).ok()
}

/// Upstream semver tags `>= start` that downstream lacks, oldest first
pub fn select_missing_tags(upstream: &[RemoteRef], downstream: &[RemoteRef], start: &Version) -> Vec<String> {
  let present: BTreeSet<&str> = downstream.iter().map(|r| r.name.as_str()).collect();
  let mut missing: Vec<(Version, String)> = upstream
    .iter()
    .filter(|r| !present.contains(r.name.as_str()))
    .filter_map(|r| {
      let version = parse_tag_version(&r.name)?;
      (version >= *start).then(|| (version, r.name.clone()))
    })
    .collect();
  missing.sort();
  missing.dedup();
  missing.into_iter().map(|(_, name)| name).collect()
}

/// Copy missing tags from `upstream` to `downstream`
///
/// Each tag is fetched into a scratch repository and pushed on its own; a
/// tag that fails is reported and the rest continue.
pub fn sync_tags(
  ctx: &RunContext,
  upstream: &str,
  downstream: &str,
  start: &Version,
  dry_run: bool,
) -> RailResult<BatchReport> {
  let upstream_url = utils::resolve_remote(upstream, None);
  let downstream_url = ctx.remote(downstream);

  let missing = select_missing_tags(
    &SystemGit::ls_remote(&upstream_url, RefKind::Tags)?,
    &SystemGit::ls_remote(&downstream_url, RefKind::Tags)?,
    start,
  );
  if missing.is_empty() {
    info!("All synced up: {} == {}", upstream, downstream);
    return Ok(BatchReport::default());
  }
  if dry_run {
    let outcomes = missing
      .iter()
      .map(|tag| {
        info!("Would sync {} => {}, tag => {}", upstream, downstream, tag);
        ItemOutcome::skipped(tag, "dry run")
      })
      .collect();
    return Ok(BatchReport::new(outcomes));
  }

  let workdir = ctx.create_workdir()?;
  let git = SystemGit::init(workdir.path())?;
  let mut outcomes = Vec::with_capacity(missing.len());
  for tag in missing {
    info!("Syncing repo {} => {}, tag => {}", upstream, downstream, tag);
    let refspec = format!("refs/tags/{}", tag);
    let result = git
      .fetch_refspec(&upstream_url, &format!("{}:{}", refspec, refspec))
      .and_then(|_| git.push(&downstream_url, &refspec, false));
    outcomes.push(match result {
      Ok(()) => ItemOutcome::done(tag),
      Err(e) => ItemOutcome::failed(tag, &e),
    });
  }
  Ok(BatchReport::new(outcomes))
}
