//! `ckrail release ...` commands

use crate::core::context::RunContext;
use crate::core::error::RailResult;
use crate::core::manifest::{RepoEntry, TagFilter};
use crate::upstream::stable::{cut_stable, stable_tag_name, tag_stable};
use std::path::PathBuf;

/// `release cut-stable` parameters
pub struct CutStableParams {
  pub layer_list: PathBuf,
  pub charm_list: PathBuf,
  pub ancillary_list: PathBuf,
  pub filter_by_tag: Vec<String>,
  pub dry_run: bool,
  pub json: bool,
}

/// Merge master into stable for layers, charms, then ancillary repositories
pub fn run_cut_stable(ctx: &RunContext, params: CutStableParams) -> RailResult<()> {
  let entries = RepoEntry::load_many(&[
    params.layer_list.as_path(),
    params.charm_list.as_path(),
    params.ancillary_list.as_path(),
  ])?;
  let filter = TagFilter::new(params.filter_by_tag);
  let report = cut_stable(ctx, &entries, &filter, params.dry_run)?;
  report.print(params.json)
}

/// `release tag-stable` parameters
pub struct TagStableParams {
  pub layer_list: PathBuf,
  pub charm_list: PathBuf,
  pub k8s_version: String,
  pub bundle_revision: String,
  pub filter_by_tag: Vec<String>,
  pub bugfix: bool,
  pub dry_run: bool,
  pub json: bool,
  pub strict: bool,
}

pub fn run_tag_stable(ctx: &RunContext, params: TagStableParams) -> RailResult<()> {
  let entries = RepoEntry::load_many(&[params.layer_list.as_path(), params.charm_list.as_path()])?;
  let filter = TagFilter::new(params.filter_by_tag);
  let tag = stable_tag_name(&params.k8s_version, &params.bundle_revision, params.bugfix);
  let report = tag_stable(ctx, &entries, &filter, &tag, params.dry_run);
  report.print(params.json)?;
  report.check(params.strict)
}
