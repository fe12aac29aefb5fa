//! `ckrail sync snaps` and `ckrail sync debs`

use crate::helpers::*;
use anyhow::Result;
use std::path::{Path, PathBuf};

fn package_list(ws: &TestWorkspace, name: &str, downstream: &Path, upstream: &Path) -> Result<PathBuf> {
  ws.write_list(
    "packages.yaml",
    &format!(
      "- {}:\n    upstream: {}\n    downstream: {}\n    tags: [k8s]\n",
      name,
      upstream.display(),
      downstream.display()
    ),
  )
}

#[test]
fn test_sync_snaps_creates_branch_per_release() -> Result<()> {
  let ws = TestWorkspace::new()?;
  let source = ws.bare_repo("kubernetes", &[])?;
  for tag in ["v1.13.9", "v1.14.0", "v1.14.1", "v1.15.0-rc.1"] {
    ws.tag(&source, tag)?;
  }
  let snap = ws.bare_repo("kubectl-snap", &["1.14.0"])?;
  let list = package_list(&ws, "kubectl", &snap, &source)?;

  let output = ws.ckrail(&["sync", "snaps", "--package-list", &list.to_string_lossy(), "--strict"])?;
  expect_success(&output)?;

  let mut branches = refs(&snap, "refs/heads")?;
  branches.sort();
  assert_eq!(branches, vec!["1.14.0", "1.14.1", "master"]);
  assert_eq!(rev(&snap, "1.14.1")?, rev(&snap, "master")?);
  Ok(())
}

#[test]
fn test_sync_debs_creates_branch_per_series() -> Result<()> {
  let ws = TestWorkspace::new()?;
  let source = ws.bare_repo("kubernetes", &[])?;
  for tag in ["v1.14.0", "v1.14.3", "v1.15.1"] {
    ws.tag(&source, tag)?;
  }
  let deb = ws.bare_repo("kubeadm-deb", &[])?;
  let list = package_list(&ws, "kubeadm", &deb, &source)?;

  let output = ws.ckrail(&[
    "sync",
    "debs",
    "--package-list",
    &list.to_string_lossy(),
    "--filter-by-tag",
    "k8s",
  ])?;
  expect_success(&output)?;

  let mut branches = refs(&deb, "refs/heads")?;
  branches.sort();
  assert_eq!(branches, vec!["1.14", "1.15", "master"]);
  Ok(())
}
