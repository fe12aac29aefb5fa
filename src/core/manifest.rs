//! Typed manifest loading
//!
//! Manifests are YAML lists of single-key mappings:
//!
//! ```yaml
//! - kubernetes-worker:
//!     namespace: containers
//!     downstream: charmed-kubernetes/charm-kubernetes-worker
//!     tags: [k8s, kubernetes-worker]
//! ```
//!
//! Each manifest kind validates the fields it needs at load time, so a
//! malformed file fails before any external command runs.

use crate::core::error::{ManifestError, RailError, RailResult};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::Path;

/// Key of the layer-index pseudo entry in layer lists
pub const LAYER_INDEX_KEY: &str = "layer:index";

/// Value side of a manifest item, before per-kind validation
#[derive(Debug, Clone, Default, Deserialize)]
struct RawEntry {
  namespace: Option<String>,
  upstream: Option<String>,
  downstream: Option<String>,
  #[serde(default)]
  tags: Vec<String>,
  resource_build_sh: Option<String>,
  needs_stable: Option<bool>,
  needs_tagging: Option<bool>,
  fragments: Option<String>,
  name: Option<String>,
}

/// Read and parse a YAML file, mapping failures to `ManifestError::Parse`
pub fn load_yaml<T: DeserializeOwned>(path: &Path) -> RailResult<T> {
  let parse_err = |reason: String| {
    RailError::Manifest(ManifestError::Parse {
      path: path.to_path_buf(),
      reason,
    })
  };
  let text = std::fs::read_to_string(path).map_err(|e| parse_err(e.to_string()))?;
  serde_yaml::from_str(&text).map_err(|e| parse_err(e.to_string()))
}

/// Load the `(key, value)` pairs of a manifest, in declared order
fn load_items(path: &Path) -> RailResult<Vec<(String, RawEntry)>> {
  let raw: Option<Vec<BTreeMap<String, Option<RawEntry>>>> = load_yaml(path)?;
  let mut items = Vec::new();
  for (index, map) in raw.unwrap_or_default().into_iter().enumerate() {
    if map.len() != 1 {
      return Err(RailError::Manifest(ManifestError::NotSingleKey {
        path: path.to_path_buf(),
        index,
        keys: map.len(),
      }));
    }
    if let Some((key, value)) = map.into_iter().next() {
      items.push((key, value.unwrap_or_default()));
    }
  }
  Ok(items)
}

fn require(path: &Path, entry: &str, field: &'static str, value: Option<String>) -> RailResult<String> {
  value.filter(|v| !v.trim().is_empty()).ok_or_else(|| {
    RailError::Manifest(ManifestError::MissingField {
      path: path.to_path_buf(),
      entry: entry.to_string(),
      field,
    })
  })
}

fn require_tags(path: &Path, entry: &str, tags: Vec<String>) -> RailResult<Vec<String>> {
  if tags.is_empty() {
    return Err(RailError::Manifest(ManifestError::MissingField {
      path: path.to_path_buf(),
      entry: entry.to_string(),
      field: "tags",
    }));
  }
  Ok(tags)
}

/// A charm to build and publish
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CharmEntry {
  pub name: String,
  pub namespace: String,
  /// `org/repo` on the git host, or a full URL / local path
  pub downstream: String,
  pub tags: Vec<String>,
  /// Resource builder script, relative to the charm checkout
  pub resource_build_sh: Option<String>,
}

impl CharmEntry {
  pub fn load_all(path: &Path) -> RailResult<Vec<Self>> {
    load_items(path)?
      .into_iter()
      .map(|(name, raw)| {
        Ok(Self {
          namespace: require(path, &name, "namespace", raw.namespace)?,
          downstream: require(path, &name, "downstream", raw.downstream)?,
          tags: require_tags(path, &name, raw.tags)?,
          resource_build_sh: raw.resource_build_sh,
          name,
        })
      })
      .collect()
  }

  /// Charm store entity, e.g. `cs:~containers/flannel`
  pub fn entity(&self) -> String {
    entity(&self.namespace, &self.name)
  }
}

/// A bundle assembled by the bundle builder
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleEntry {
  /// Manifest key, also the build output directory name
  pub key: String,
  /// Published name, defaults to the key
  pub name: String,
  pub namespace: String,
  /// Fragment argument passed to the bundle builder
  pub fragments: String,
  pub tags: Vec<String>,
}

impl BundleEntry {
  pub fn load_all(path: &Path) -> RailResult<Vec<Self>> {
    load_items(path)?
      .into_iter()
      .map(|(key, raw)| {
        Ok(Self {
          namespace: require(path, &key, "namespace", raw.namespace)?,
          fragments: require(path, &key, "fragments", raw.fragments)?,
          tags: require_tags(path, &key, raw.tags)?,
          name: raw.name.unwrap_or_else(|| key.clone()),
          key,
        })
      })
      .collect()
  }

  pub fn entity(&self) -> String {
    entity(&self.namespace, &self.name)
  }
}

/// A git repository taking part in sync, stable and tagging workflows
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoEntry {
  pub name: String,
  pub upstream: Option<String>,
  pub downstream: String,
  pub tags: Vec<String>,
  pub needs_stable: bool,
  pub needs_tagging: bool,
}

impl RepoEntry {
  /// Load a layer, charm, ancillary or package list; the layer-index
  /// pseudo entry is skipped
  pub fn load_all(path: &Path) -> RailResult<Vec<Self>> {
    load_items(path)?
      .into_iter()
      .filter(|(key, _)| key != LAYER_INDEX_KEY)
      .map(|(name, raw)| {
        Ok(Self {
          downstream: require(path, &name, "downstream", raw.downstream)?,
          upstream: raw.upstream.filter(|u| !u.trim().is_empty()),
          tags: raw.tags,
          needs_stable: raw.needs_stable.unwrap_or(true),
          needs_tagging: raw.needs_tagging.unwrap_or(true),
          name,
        })
      })
      .collect()
  }

  /// Load several lists and concatenate them in argument order
  pub fn load_many(paths: &[&Path]) -> RailResult<Vec<Self>> {
    let mut all = Vec::new();
    for path in paths {
      all.extend(Self::load_all(path)?);
    }
    Ok(all)
  }
}

/// Kind of a layer list entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerKind {
  Layer,
  Interface,
}

/// `layer:<name>` or `interface:<name>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayerRef {
  pub kind: LayerKind,
  pub name: String,
}

impl LayerRef {
  pub fn parse(key: &str) -> RailResult<Self> {
    let unknown = || {
      RailError::Manifest(ManifestError::UnknownCategory {
        entry: key.to_string(),
      })
    };
    let (kind, name) = key.split_once(':').ok_or_else(unknown)?;
    let kind = match kind {
      "layer" => LayerKind::Layer,
      "interface" => LayerKind::Interface,
      _ => return Err(unknown()),
    };
    if name.is_empty() {
      return Err(unknown());
    }
    Ok(Self {
      kind,
      name: name.to_string(),
    })
  }

  /// Layer list keys, minus the index entry; any unknown category is fatal
  pub fn load_all(path: &Path) -> RailResult<Vec<Self>> {
    load_items(path)?
      .into_iter()
      .filter(|(key, _)| key != LAYER_INDEX_KEY)
      .map(|(key, _)| Self::parse(&key))
      .collect()
  }
}

impl fmt::Display for LayerRef {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self.kind {
      LayerKind::Layer => write!(f, "layer:{}", self.name),
      LayerKind::Interface => write!(f, "interface:{}", self.name),
    }
  }
}

/// Build a charm store entity from namespace and name
pub fn entity(namespace: &str, name: &str) -> String {
  format!("cs:~{}/{}", namespace, name)
}

/// Inclusion predicate over manifest tags
///
/// An empty filter admits every entry. Otherwise an entry passes when at
/// least one of its tags is in the filter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagFilter {
  tags: BTreeSet<String>,
}

impl TagFilter {
  pub fn new<I, S>(tags: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    Self {
      tags: tags.into_iter().map(Into::into).collect(),
    }
  }

  pub fn is_empty(&self) -> bool {
    self.tags.is_empty()
  }

  pub fn matches(&self, entry_tags: &[String]) -> bool {
    self.tags.is_empty() || entry_tags.iter().any(|t| self.tags.contains(t))
  }
}

/// Produced file name → resource key, per package identity
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct ResourceSpec {
  entries: BTreeMap<String, BTreeMap<String, String>>,
}

impl ResourceSpec {
  pub fn load(path: &Path) -> RailResult<Self> {
    let spec: Option<Self> = load_yaml(path)?;
    Ok(spec.unwrap_or_default())
  }

  /// The file→key mapping for `entity`; a missing or empty fragment is fatal
  pub fn fragment(&self, entity: &str) -> RailResult<&BTreeMap<String, String>> {
    self.entries.get(entity).filter(|f| !f.is_empty()).ok_or_else(|| {
      RailError::Manifest(ManifestError::NoResourceSpec {
        entity: entity.to_string(),
      })
    })
  }
}
