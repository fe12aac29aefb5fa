//! Resource resolution and attachment
//!
//! Two paths feed resources into the charm store:
//!
//! - oci-image resources declared in a built artifact's `metadata.yaml` with
//!   an `upstream-source` are pulled and passed to `charm push`
//! - files produced by a resource builder script are attached one by one,
//!   keyed through the resource spec

use crate::charm::container;
use crate::charm::store::CharmStore;
use crate::core::error::RailResult;
use crate::core::exec::{ToolCommand, ToolRunner};
use crate::core::manifest::{ResourceSpec, load_yaml};
use crate::core::retry::{RetryPolicy, retry};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::info;

const OCI_IMAGE: &str = "oci-image";

/// One entry of a `metadata.yaml` `resources` mapping
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ResourceDecl {
  #[serde(rename = "type", default)]
  pub kind: String,
  #[serde(rename = "upstream-source")]
  pub upstream_source: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ArtifactMetadata {
  #[serde(default)]
  resources: Option<BTreeMap<String, ResourceDecl>>,
}

/// An image resource to pull and push alongside an artifact
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageResource {
  pub name: String,
  pub image: String,
}

/// oci-image resources that declare a non-empty upstream source, by name
pub fn select_images(resources: &BTreeMap<String, ResourceDecl>) -> Vec<ImageResource> {
  resources
    .iter()
    .filter(|(_, decl)| decl.kind == OCI_IMAGE)
    .filter_map(|(name, decl)| {
      let image = decl.upstream_source.as_deref()?.trim();
      if image.is_empty() {
        return None;
      }
      Some(ImageResource {
        name: name.clone(),
        image: image.to_string(),
      })
    })
    .collect()
}

/// Image resources of the artifact built in `out_path`
///
/// An artifact without a `metadata.yaml` (bundles) has none.
pub fn resolve_images(out_path: &Path) -> RailResult<Vec<ImageResource>> {
  let metadata_path = out_path.join("metadata.yaml");
  if !metadata_path.exists() {
    return Ok(Vec::new());
  }
  let metadata: Option<ArtifactMetadata> = load_yaml(&metadata_path)?;
  let resources = metadata.and_then(|m| m.resources).unwrap_or_default();
  Ok(select_images(&resources))
}

/// `--resource name=image` pairs for `charm push`
pub fn image_args(images: &[ImageResource]) -> Vec<String> {
  images
    .iter()
    .flat_map(|i| ["--resource".to_string(), format!("{}={}", i.name, i.image)])
    .collect()
}

/// Pull every image; the first failure aborts
pub fn pull_images(runner: &dyn ToolRunner, images: &[ImageResource]) -> RailResult<()> {
  for image in images {
    container::pull_image(runner, &image.image)?;
  }
  Ok(())
}

/// Inputs of one resource build-and-attach run
#[derive(Debug, Clone)]
pub struct AttachRequest<'a> {
  pub entity: &'a str,
  pub channel: &'a str,
  /// Builder script, run with `bash` inside `out_path`
  pub builder: &'a Path,
  pub out_path: &'a Path,
  pub spec: &'a ResourceSpec,
}

/// Build resources for an entity and attach every produced file the spec
/// knows about
///
/// Returns the attached resource keys. An entity with no resources at the
/// channel attaches nothing and is not an error. Each file gets its own
/// retry budget.
pub fn attach_resources(
  runner: &dyn ToolRunner,
  request: &AttachRequest<'_>,
  policy: &RetryPolicy,
) -> RailResult<Vec<String>> {
  let fragment = request.spec.fragment(request.entity)?;
  info!("Resource spec for {}: {:?}", request.entity, fragment);

  std::fs::create_dir_all(request.out_path)?;
  let store = CharmStore::new(runner);
  let id = store.show_id(request.entity, request.channel)?;
  if store.list_resources(&id, request.channel)?.is_none() {
    info!("No resources found for {}", id);
    return Ok(Vec::new());
  }

  let builder = std::path::absolute(request.builder)?;
  info!("Running {}", builder.display());
  runner.run(
    &ToolCommand::new("bash")
      .arg(builder.display().to_string())
      .current_dir(request.out_path)
      .echo(),
  )?;

  let mut attached = Vec::new();
  for path in produced_files(request.out_path)? {
    let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
      continue;
    };
    let Some(key) = fragment.get(file_name) else {
      continue;
    };
    retry(policy, &format!("attach {}", key), || {
      store.attach(request.entity, request.channel, key, &path)
    })?;
    info!("Attached {} as {}", path.display(), key);
    attached.push(key.clone());
  }
  Ok(attached)
}

/// Files directly under `dir`, sorted by name
fn produced_files(dir: &Path) -> RailResult<Vec<PathBuf>> {
  let mut files = Vec::new();
  for entry in std::fs::read_dir(dir)? {
    let path = entry?.path();
    if path.is_file() {
      files.push(path);
    }
  }
  files.sort();
  Ok(files)
}
