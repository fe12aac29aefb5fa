//! Thin client over the `charm` packaging CLI
//!
//! Only the output contracts the workflows depend on are parsed: the entity
//! id from `charm show`, the resource list from `charm list-resources`, and
//! the url line printed by `charm push`.

use crate::core::error::{RailError, RailResult};
use crate::core::exec::{ToolCommand, ToolOutput, ToolRunner};
use serde::{Deserialize, Serialize};
use std::path::Path;

const CHARM: &str = "charm";

/// A resource revision published at a channel
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelResource {
  pub name: String,
  pub revision: i64,
}

impl ChannelResource {
  /// `--resource` value for `charm release`
  pub fn release_arg(&self) -> String {
    format!("{}-{}", self.name, self.revision)
  }
}

#[derive(Deserialize)]
struct ShowId {
  id: EntityId,
}

#[derive(Deserialize)]
struct EntityId {
  #[serde(rename = "Id")]
  id: String,
}

#[derive(Deserialize)]
struct PushResult {
  url: String,
}

pub struct CharmStore<'a> {
  runner: &'a dyn ToolRunner,
}

impl<'a> CharmStore<'a> {
  pub fn new(runner: &'a dyn ToolRunner) -> Self {
    Self { runner }
  }

  fn charm(&self) -> ToolCommand {
    ToolCommand::new(CHARM)
  }

  /// Canonical revisioned id of `entity` at `channel`
  pub fn show_id(&self, entity: &str, channel: &str) -> RailResult<String> {
    let out = self
      .runner
      .run(&self.charm().args(["show", entity, "--channel", channel, "id"]))?;
    let parsed: ShowId = serde_yaml::from_str(&out.stdout).map_err(|e| {
      RailError::with_help(
        format!("Unexpected `charm show` output for {}: {}", entity, e),
        format!("Check that {} is published at channel '{}'", entity, channel),
      )
    })?;
    Ok(parsed.id.id)
  }

  /// Raw `list-resources` call; a non-zero exit is returned, not raised
  pub fn list_resources_output(&self, id: &str, channel: &str) -> RailResult<ToolOutput> {
    self.runner.output(
      &self
        .charm()
        .args(["list-resources", id, "--channel", channel, "--format", "yaml"]),
    )
  }

  /// Resources of `id` at `channel`
  ///
  /// `Ok(None)` when the store reports no resources (non-zero exit).
  pub fn list_resources(&self, id: &str, channel: &str) -> RailResult<Option<Vec<ChannelResource>>> {
    let out = self.list_resources_output(id, channel)?;
    if !out.success() {
      return Ok(None);
    }
    Ok(Some(parse_resource_list(&out.stdout)?))
  }

  pub fn release(&self, id: &str, channel: &str, resources: &[ChannelResource]) -> RailResult<()> {
    let mut cmd = self.charm().args(["release", id, "--channel", channel]);
    for resource in resources {
      cmd = cmd.arg("--resource").arg(resource.release_arg());
    }
    self.runner.run(&cmd).map(|_| ())
  }

  /// Push a built artifact; returns the revisioned url the store assigned
  pub fn push(&self, out_path: &Path, entity: &str, resource_args: &[String]) -> RailResult<String> {
    let cmd = self
      .charm()
      .arg("push")
      .arg(out_path.display().to_string())
      .arg(entity)
      .args(resource_args.iter().cloned());
    let out = self.runner.run(&cmd)?;
    parse_push_url(&out.stdout)
  }

  /// Record the source commit on a pushed revision
  pub fn set_commit(&self, url: &str, commit: &str) -> RailResult<()> {
    self
      .runner
      .run(&self.charm().args(["set", url, &format!("commit={}", commit)]))
      .map(|_| ())
  }

  pub fn attach(&self, entity: &str, channel: &str, key: &str, path: &Path) -> RailResult<()> {
    let cmd = self
      .charm()
      .args(["attach", entity, "--channel", channel])
      .arg(format!("{}={}", key, path.display()));
    self.runner.run(&cmd).map(|_| ())
  }

  /// `charm pull-source -v -i <index> <layer>`
  pub fn pull_source(&self, layer_index: &str, layer: &str) -> RailResult<()> {
    self
      .runner
      .run(&self.charm().args(["pull-source", "-v", "-i", layer_index, layer]).echo())
      .map(|_| ())
  }

  /// `charm build -r --force` inside a charm checkout
  pub fn build(&self, src: &Path) -> RailResult<()> {
    self
      .runner
      .run(&self.charm().args(["build", "-r", "--force"]).current_dir(src).echo())
      .map(|_| ())
  }

  pub fn proof(&self, built: &Path) -> RailResult<()> {
    self
      .runner
      .run(&self.charm().arg("proof").current_dir(built))
      .map(|_| ())
  }
}

fn parse_resource_list(stdout: &str) -> RailResult<Vec<ChannelResource>> {
  if stdout.trim().is_empty() {
    return Ok(Vec::new());
  }
  let list: Option<Vec<ChannelResource>> = serde_yaml::from_str(stdout)?;
  Ok(list.unwrap_or_default())
}

/// First stdout line of `charm push` is `url: <revisioned url>`; the rest is
/// upload noise
fn parse_push_url(stdout: &str) -> RailResult<String> {
  let first = stdout.trim().lines().next().unwrap_or_default();
  let parsed: PushResult = serde_yaml::from_str(first)
    .map_err(|e| RailError::message(format!("Unexpected `charm push` output {:?}: {}", first, e)))?;
  Ok(parsed.url)
}
