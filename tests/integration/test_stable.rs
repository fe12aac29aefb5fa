//! `ckrail release cut-stable` and `ckrail release tag-stable`

use crate::helpers::*;
use anyhow::Result;
use std::path::{Path, PathBuf};

fn repo_list(ws: &TestWorkspace, file: &str, entries: &[(&str, &Path, &str)]) -> Result<PathBuf> {
  let mut body = String::new();
  for (name, downstream, extra) in entries {
    body.push_str(&format!("- {}:\n    downstream: {}\n", name, downstream.display()));
    body.push_str(extra);
  }
  if body.is_empty() {
    body.push_str("[]\n");
  }
  ws.write_list(file, &body)
}

#[test]
fn test_cut_stable_merges_master_with_merge_commit() -> Result<()> {
  let ws = TestWorkspace::new()?;
  let repo = ws.bare_repo("kubernetes-worker", &["stable"])?;
  let master = ws.push_commit(&repo, "master", "fix.txt", "bugfix\n")?;

  let charms = repo_list(&ws, "charms.yaml", &[("kubernetes-worker", repo.as_path(), "    tags: [k8s]\n")])?;
  let layers = repo_list(&ws, "layers.yaml", &[])?;
  let ancillary = repo_list(&ws, "ancillary.yaml", &[])?;

  let output = ws.ckrail(&[
    "release",
    "cut-stable",
    "--layer-list",
    &layers.to_string_lossy(),
    "--charm-list",
    &charms.to_string_lossy(),
    "--ancillary-list",
    &ancillary.to_string_lossy(),
    "--filter-by-tag",
    "k8s",
  ])?;
  expect_success(&output)?;

  assert_eq!(rev(&repo, "stable^2")?, master);
  Ok(())
}

#[test]
fn test_cut_stable_leaves_matching_branches_alone() -> Result<()> {
  let ws = TestWorkspace::new()?;
  let repo = ws.bare_repo("etcd", &["stable"])?;
  let before = rev(&repo, "stable")?;

  let charms = repo_list(&ws, "charms.yaml", &[("etcd", repo.as_path(), "")])?;
  let layers = repo_list(&ws, "layers.yaml", &[])?;
  let ancillary = repo_list(&ws, "ancillary.yaml", &[])?;

  let output = ws.ckrail(&[
    "release",
    "cut-stable",
    "--layer-list",
    &layers.to_string_lossy(),
    "--charm-list",
    &charms.to_string_lossy(),
    "--ancillary-list",
    &ancillary.to_string_lossy(),
    "--json",
  ])?;
  let stdout = expect_success(&output)?;

  let report: serde_json::Value = serde_json::from_str(&stdout)?;
  assert_eq!(report["outcomes"][0]["status"], "skipped");
  assert_eq!(report["outcomes"][0]["reason"], "master == stable");
  assert_eq!(rev(&repo, "stable")?, before);
  Ok(())
}

#[test]
fn test_tag_stable_tags_stable_tip() -> Result<()> {
  let ws = TestWorkspace::new()?;
  let repo = ws.bare_repo("flannel", &["stable"])?;
  ws.push_commit(&repo, "master", "later.txt", "not shipped\n")?;
  let stable = rev(&repo, "stable")?;
  let skipped = ws.bare_repo("docs", &["stable"])?;

  let charms = repo_list(
    &ws,
    "charms.yaml",
    &[
      ("flannel", repo.as_path(), ""),
      ("docs", skipped.as_path(), "    needs_tagging: false\n"),
    ],
  )?;
  let layers = repo_list(&ws, "layers.yaml", &[])?;

  let output = ws.ckrail(&[
    "release",
    "tag-stable",
    "--layer-list",
    &layers.to_string_lossy(),
    "--charm-list",
    &charms.to_string_lossy(),
    "--k8s-version",
    "1.29",
    "--bundle-revision",
    "1234",
    "--strict",
  ])?;
  expect_success(&output)?;

  assert_eq!(rev(&repo, "ck-1.29-1234^{commit}")?, stable);
  assert!(refs(&skipped, "refs/tags")?.is_empty());
  Ok(())
}

#[test]
fn test_tag_stable_strict_fails_on_missing_repo() -> Result<()> {
  let ws = TestWorkspace::new()?;
  let missing = ws.root.join("remotes").join("gone.git");
  let charms = repo_list(&ws, "charms.yaml", &[("gone", missing.as_path(), "")])?;
  let layers = repo_list(&ws, "layers.yaml", &[])?;

  let layers = layers.to_string_lossy().to_string();
  let charms = charms.to_string_lossy().to_string();
  let mut args = vec![
    "release",
    "tag-stable",
    "--layer-list",
    layers.as_str(),
    "--charm-list",
    charms.as_str(),
    "--k8s-version",
    "1.29",
    "--bundle-revision",
    "1",
  ];

  // Without --strict the failure is only reported
  expect_success(&ws.ckrail(&args)?)?;

  args.push("--strict");
  assert_eq!(ws.ckrail(&args)?.status.code(), Some(3));
  Ok(())
}
