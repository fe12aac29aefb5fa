//! `ckrail charm ...` commands

use crate::charm::build::{BuildOptions, build_bundles, build_charms};
use crate::charm::layers::pull_layers;
use crate::charm::promote::promote_all;
use crate::charm::resources::{AttachRequest, attach_resources};
use crate::core::context::RunContext;
use crate::core::error::RailResult;
use crate::core::fanout::{BatchReport, ItemOutcome};
use crate::core::manifest::{BundleEntry, CharmEntry, LayerRef, ResourceSpec, TagFilter};
use crate::core::retry::RetryPolicy;
use std::path::PathBuf;
use std::time::Duration;

/// `charm pull-layers` parameters
pub struct PullLayersParams {
  pub layer_index: String,
  pub layer_list: PathBuf,
  pub layer_branch: String,
  pub retries: u32,
  pub timeout: u64,
}

pub fn run_pull_layers(ctx: &RunContext, params: PullLayersParams) -> RailResult<()> {
  let dirs = ctx.env.require_charm_dirs()?;
  let layers = LayerRef::load_all(&params.layer_list)?;
  let policy = RetryPolicy::new(params.retries, Duration::from_secs(params.timeout));
  pull_layers(
    ctx.runner(),
    dirs,
    &layers,
    &params.layer_index,
    &params.layer_branch,
    &policy,
  )?;
  println!("✅ Pulled {} layer(s)", layers.len());
  Ok(())
}

/// `charm build` parameters
pub struct BuildParams {
  pub charm_list: PathBuf,
  pub layer_list: PathBuf,
  pub layer_index: String,
  pub resource_spec: PathBuf,
  pub bundle_list: PathBuf,
  pub filter_by_tag: Vec<String>,
  pub charm_branch: String,
  pub layer_branch: String,
  pub bundle_repo: String,
  pub to_channel: String,
  pub dry_run: bool,
  pub json: bool,
}

pub fn run_build(ctx: &RunContext, params: BuildParams) -> RailResult<()> {
  let dirs = ctx.env.require_charm_dirs()?;

  // Load everything up front so a malformed file fails before any pull
  let charms = CharmEntry::load_all(&params.charm_list)?;
  let bundles = BundleEntry::load_all(&params.bundle_list)?;
  let layers = LayerRef::load_all(&params.layer_list)?;
  let spec = ResourceSpec::load(&params.resource_spec)?;
  let filter = TagFilter::new(params.filter_by_tag);

  let options = BuildOptions {
    charm_branch: &params.charm_branch,
    to_channel: &params.to_channel,
    bundle_repo: &params.bundle_repo,
    dry_run: params.dry_run,
  };

  if params.dry_run {
    tracing::info!("[dry-run] skipping pull of {} layer(s)", layers.len());
  } else {
    pull_layers(
      ctx.runner(),
      dirs,
      &layers,
      &params.layer_index,
      &params.layer_branch,
      &RetryPolicy::layer_pull(),
    )?;
  }

  let mut report = build_charms(ctx, dirs, &charms, &filter, &spec, &options)?;
  report
    .outcomes
    .extend(build_bundles(ctx, &bundles, &filter, &options)?.outcomes);
  report.print(params.json)
}

/// `charm promote` parameters
pub struct PromoteParams {
  pub charm_list: PathBuf,
  pub from_channel: String,
  pub to_channel: String,
  pub filter_by_tag: Vec<String>,
  pub dry_run: bool,
  pub json: bool,
}

pub fn run_promote(ctx: &RunContext, params: PromoteParams) -> RailResult<()> {
  let charms = CharmEntry::load_all(&params.charm_list)?;
  let filter = TagFilter::new(params.filter_by_tag);
  let entities: Vec<String> = charms
    .iter()
    .filter(|c| filter.matches(&c.tags))
    .map(CharmEntry::entity)
    .collect();

  let plans = promote_all(
    ctx.runner(),
    &entities,
    &params.from_channel,
    &params.to_channel,
    params.dry_run,
  )?;

  if params.json {
    println!("{}", serde_json::to_string_pretty(&plans)?);
    return Ok(());
  }
  let outcomes = plans
    .iter()
    .map(|p| {
      if params.dry_run {
        ItemOutcome::skipped(&p.entity, "dry run")
      } else {
        ItemOutcome::done(&p.entity)
      }
    })
    .collect();
  BatchReport::new(outcomes).print(false)
}

/// `charm resource` parameters
pub struct ResourceParams {
  pub charm_entity: String,
  pub channel: String,
  pub builder: PathBuf,
  pub out_path: PathBuf,
  pub resource_spec: PathBuf,
}

pub fn run_resource(ctx: &RunContext, params: ResourceParams) -> RailResult<()> {
  let spec = ResourceSpec::load(&params.resource_spec)?;
  let request = AttachRequest {
    entity: &params.charm_entity,
    channel: &params.channel,
    builder: &params.builder,
    out_path: &params.out_path,
    spec: &spec,
  };
  let attached = attach_resources(ctx.runner(), &request, &RetryPolicy::attach())?;
  println!("✅ Attached {} resource(s) to {}", attached.len(), params.charm_entity);
  Ok(())
}
