//! Charm and bundle build + publish
//!
//! A build run pulls the layer set, then for every charm passing the tag
//! filter: clone, `charm build`, `charm proof`, push to the unpublished
//! channel, attach built resources. The pushed charms are then promoted to
//! the target channel. Bundles follow the same push-and-promote path, built
//! by the bundle builder script from its own repository.

use crate::charm::promote::promote_all;
use crate::charm::resources::{AttachRequest, attach_resources, image_args, pull_images, resolve_images};
use crate::charm::store::CharmStore;
use crate::core::config::CharmDirs;
use crate::core::context::RunContext;
use crate::core::error::RailResult;
use crate::core::exec::{ToolCommand, ToolRunner};
use crate::core::fanout::{BatchReport, ItemOutcome};
use crate::core::manifest::{BundleEntry, CharmEntry, ResourceSpec, TagFilter};
use crate::core::retry::RetryPolicy;
use crate::core::vcs::SystemGit;
use crate::utils;
use std::path::Path;
use tracing::info;

/// Channel every fresh push lands in
pub const UNPUBLISHED: &str = "unpublished";

pub const DEFAULT_BUNDLE_REPO: &str = "https://github.com/juju-solutions/bundle-canonical-kubernetes.git";

/// Knobs shared by charm and bundle builds
#[derive(Debug, Clone)]
pub struct BuildOptions<'a> {
  pub charm_branch: &'a str,
  pub to_channel: &'a str,
  pub bundle_repo: &'a str,
  pub dry_run: bool,
}

/// Push a built artifact and record the commit it was built from
///
/// oci-image resources with an upstream source are pulled first and pushed
/// alongside. Returns the revisioned url.
pub fn publish(runner: &dyn ToolRunner, repo: &Path, out_path: &Path, entity: &str) -> RailResult<String> {
  info!("Pushing :: {} :: {}", repo.display(), entity);
  let commit = SystemGit::open(repo)?.head_commit()?;
  info!("Pushing :: grabbing git revision {}", commit);

  let images = resolve_images(out_path)?;
  info!("Pushing :: found {} oci-image resources", images.len());
  pull_images(runner, &images)?;

  let store = CharmStore::new(runner);
  let url = store.push(out_path, entity, &image_args(&images))?;
  info!("Pushing :: setting {} metadata: {}", url, commit);
  store.set_commit(&url, &commit)?;
  Ok(url)
}

/// Clone, build, proof, push and resource one charm
pub fn build_charm(
  ctx: &RunContext,
  dirs: &CharmDirs,
  charm: &CharmEntry,
  spec: &ResourceSpec,
  options: &BuildOptions<'_>,
) -> RailResult<String> {
  let runner = ctx.runner();
  let store = CharmStore::new(runner);
  let entity = charm.entity();

  let src = ctx.reserve_workdir()?;
  SystemGit::clone_into(&ctx.remote(&charm.downstream), src.path(), Some(options.charm_branch))?;

  store.build(src.path())?;
  let dst = dirs.build_dir.join(&charm.name);
  store.proof(&dst)?;
  let url = publish(runner, src.path(), &dst, &entity)?;

  if let Some(builder) = &charm.resource_build_sh {
    let builder = src.path().join(builder);
    let out_path = dst.join("tmp");
    let request = AttachRequest {
      entity: &entity,
      channel: UNPUBLISHED,
      builder: &builder,
      out_path: &out_path,
      spec,
    };
    attach_resources(runner, &request, &RetryPolicy::attach())?;
  }
  Ok(url)
}

/// Build every charm passing `filter`, then promote them to the target channel
///
/// Any failure aborts the run.
pub fn build_charms(
  ctx: &RunContext,
  dirs: &CharmDirs,
  charms: &[CharmEntry],
  filter: &TagFilter,
  spec: &ResourceSpec,
  options: &BuildOptions<'_>,
) -> RailResult<BatchReport> {
  info!("Building :: charm builds");
  let mut outcomes = Vec::new();
  let mut built = Vec::new();

  for charm in charms.iter().filter(|c| filter.matches(&c.tags)) {
    if options.dry_run {
      info!(
        "Building :: {:^25} :: vcs-branch: {} to-channel: {} tags: {}",
        charm.name,
        options.charm_branch,
        options.to_channel,
        charm.tags.join(",")
      );
      outcomes.push(ItemOutcome::skipped(&charm.name, "dry run"));
      continue;
    }
    build_charm(ctx, dirs, charm, spec, options)?;
    built.push(charm.entity());
    outcomes.push(ItemOutcome::done(&charm.name));
  }

  promote_all(ctx.runner(), &built, UNPUBLISHED, options.to_channel, options.dry_run)?;
  Ok(BatchReport::new(outcomes))
}

/// Build, push and promote every bundle passing `filter`
pub fn build_bundles(
  ctx: &RunContext,
  bundles: &[BundleEntry],
  filter: &TagFilter,
  options: &BuildOptions<'_>,
) -> RailResult<BatchReport> {
  info!("Building :: bundle builds");
  let selected: Vec<&BundleEntry> = bundles.iter().filter(|b| filter.matches(&b.tags)).collect();

  if options.dry_run {
    let outcomes = selected
      .iter()
      .map(|b| {
        info!("Building :: {:^25} :: fragments: {} to-channel: {}", b.key, b.fragments, options.to_channel);
        ItemOutcome::skipped(&b.key, "dry run")
      })
      .collect();
    return Ok(BatchReport::new(outcomes));
  }
  if selected.is_empty() {
    return Ok(BatchReport::default());
  }

  let runner = ctx.runner();
  let repo = ctx.reserve_workdir()?;
  SystemGit::clone_into(&utils::resolve_remote(options.bundle_repo, None), repo.path(), None)?;
  let out_root = ctx.create_workdir()?;
  let builder = repo.path().join("bundle");

  let mut outcomes = Vec::new();
  let mut built = Vec::new();
  for bundle in selected {
    let out_path = out_root.path().join(&bundle.key);
    runner.run(
      &ToolCommand::new("bash")
        .arg(builder.display().to_string())
        .arg("-o")
        .arg(out_path.display().to_string())
        .args(["-c", options.to_channel])
        .arg(bundle.fragments.as_str())
        .echo(),
    )?;
    let entity = bundle.entity();
    publish(runner, repo.path(), &out_path, &entity)?;
    built.push(entity);
    outcomes.push(ItemOutcome::done(&bundle.key));
  }

  promote_all(runner, &built, UNPUBLISHED, options.to_channel, false)?;
  Ok(BatchReport::new(outcomes))
}
