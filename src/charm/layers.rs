//! Layer and interface source pulls
//!
//! Every `layer:` / `interface:` entry of a layer list is fetched with
//! `charm pull-source` under a retry policy, then its checkout is forced onto
//! the requested branch. A layer that cannot be pulled aborts the run: a
//! partial layer set would produce a broken build.

use crate::charm::store::CharmStore;
use crate::core::config::CharmDirs;
use crate::core::error::RailResult;
use crate::core::exec::ToolRunner;
use crate::core::manifest::{LayerKind, LayerRef};
use crate::core::retry::{RetryPolicy, retry};
use crate::core::vcs::SystemGit;
use std::path::PathBuf;
use tracing::info;

/// Where `pull-source` places a layer or interface
pub fn layer_checkout(dirs: &CharmDirs, layer: &LayerRef) -> PathBuf {
  match layer.kind {
    LayerKind::Layer => dirs.layers_dir.join(&layer.name),
    LayerKind::Interface => dirs.interfaces_dir.join(&layer.name),
  }
}

pub fn pull_layers(
  runner: &dyn ToolRunner,
  dirs: &CharmDirs,
  layers: &[LayerRef],
  layer_index: &str,
  branch: &str,
  policy: &RetryPolicy,
) -> RailResult<()> {
  let store = CharmStore::new(runner);
  for layer in layers {
    info!("Pulling layers :: {}", layer);
    let label = layer.to_string();
    retry(policy, &format!("pull {}", label), || store.pull_source(layer_index, &label))?;

    SystemGit::open(&layer_checkout(dirs, layer))?.checkout(branch, true)?;
  }
  Ok(())
}
