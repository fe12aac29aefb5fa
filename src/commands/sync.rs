//! `ckrail sync ...` commands

use crate::core::context::RunContext;
use crate::core::error::{ConfigError, RailError, RailResult};
use crate::core::fanout::default_workers;
use crate::core::manifest::{RepoEntry, TagFilter};
use crate::upstream::forks::sync_forks;
use crate::upstream::packages::{PackageKind, sync_packages};
use crate::upstream::tags::sync_tags;
use semver::Version;
use std::path::PathBuf;

fn parse_semver(flag: &str, value: &str) -> RailResult<Version> {
  Version::parse(value.strip_prefix('v').unwrap_or(value)).map_err(|e| {
    RailError::Config(ConfigError::Invalid {
      name: flag.to_string(),
      reason: format!("'{}' is not a semver version: {}", value, e),
    })
  })
}

/// `sync forks` parameters
pub struct ForksParams {
  pub layer_list: PathBuf,
  pub charm_list: PathBuf,
  pub jobs: Option<usize>,
  pub dry_run: bool,
  pub json: bool,
  pub strict: bool,
}

pub fn run_sync_forks(ctx: &RunContext, params: ForksParams) -> RailResult<()> {
  let entries = RepoEntry::load_many(&[params.layer_list.as_path(), params.charm_list.as_path()])?;
  let workers = params.jobs.unwrap_or_else(default_workers);
  let report = sync_forks(ctx, &entries, workers, params.dry_run)?;
  report.print(params.json)?;
  report.check(params.strict)
}

/// `sync tags` parameters
pub struct TagsParams {
  pub upstream: String,
  pub downstream: String,
  pub starting_semver: String,
  pub dry_run: bool,
  pub json: bool,
  pub strict: bool,
}

pub fn run_sync_tags(ctx: &RunContext, params: TagsParams) -> RailResult<()> {
  let start = parse_semver("--starting-semver", &params.starting_semver)?;
  let report = sync_tags(ctx, &params.upstream, &params.downstream, &start, params.dry_run)?;
  report.print(params.json)?;
  report.check(params.strict)
}

/// `sync snaps` / `sync debs` parameters
pub struct PackagesParams {
  pub package_list: PathBuf,
  pub upstream: String,
  pub starting_semver: String,
  pub filter_by_tag: Vec<String>,
  pub dry_run: bool,
  pub json: bool,
  pub strict: bool,
}

pub fn run_sync_packages(ctx: &RunContext, kind: PackageKind, params: PackagesParams) -> RailResult<()> {
  let start = parse_semver("--starting-semver", &params.starting_semver)?;
  let entries = RepoEntry::load_all(&params.package_list)?;
  let filter = TagFilter::new(params.filter_by_tag);
  let report = sync_packages(ctx, &entries, kind, &params.upstream, &start, &filter, params.dry_run);
  report.print(params.json)?;
  report.check(params.strict)
}
