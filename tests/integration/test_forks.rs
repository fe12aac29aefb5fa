//! `ckrail sync forks` against local bare repositories

use crate::helpers::*;
use anyhow::Result;

#[test]
fn test_sync_forks_fast_forwards_downstream() -> Result<()> {
  let ws = TestWorkspace::new()?;
  let upstream = ws.bare_repo("upstream-flannel", &[])?;
  let downstream = ws.fork(&upstream, "flannel")?;
  let tip = ws.push_commit(&upstream, "master", "CHANGES.md", "new upstream work\n")?;
  assert_ne!(rev(&downstream, "master")?, tip);

  let layers = ws.write_list(
    "layers.yaml",
    &format!(
      "- layer:index:\n    downstream: ignored/index\n- layer:flannel:\n    upstream: {}\n    downstream: {}\n",
      upstream.display(),
      downstream.display()
    ),
  )?;
  let charms = ws.write_list("charms.yaml", "[]\n")?;

  let output = ws.ckrail(&[
    "sync",
    "forks",
    "--layer-list",
    &layers.to_string_lossy(),
    "--charm-list",
    &charms.to_string_lossy(),
    "--jobs",
    "2",
    "--strict",
  ])?;
  expect_success(&output)?;

  assert_eq!(rev(&downstream, "master")?, tip);
  Ok(())
}

#[test]
fn test_sync_forks_skips_entries_without_upstream() -> Result<()> {
  let ws = TestWorkspace::new()?;
  let downstream = ws.bare_repo("etcd", &[])?;
  let before = rev(&downstream, "master")?;

  let charms = ws.write_list(
    "charms.yaml",
    &format!("- etcd:\n    downstream: {}\n", downstream.display()),
  )?;
  let layers = ws.write_list("layers.yaml", "[]\n")?;

  let output = ws.ckrail(&[
    "sync",
    "forks",
    "--layer-list",
    &layers.to_string_lossy(),
    "--charm-list",
    &charms.to_string_lossy(),
    "--json",
  ])?;
  let stdout = expect_success(&output)?;

  let report: serde_json::Value = serde_json::from_str(&stdout)?;
  assert_eq!(report["outcomes"][0]["item"], "etcd");
  assert_eq!(report["outcomes"][0]["status"], "skipped");
  assert_eq!(rev(&downstream, "master")?, before);
  Ok(())
}

#[test]
fn test_sync_forks_strict_reports_failure() -> Result<()> {
  let ws = TestWorkspace::new()?;
  let upstream = ws.bare_repo("upstream-calico", &[])?;
  let missing = ws.root.join("remotes").join("does-not-exist.git");

  let charms = ws.write_list(
    "charms.yaml",
    &format!(
      "- calico:\n    upstream: {}\n    downstream: {}\n",
      upstream.display(),
      missing.display()
    ),
  )?;
  let layers = ws.write_list("layers.yaml", "[]\n")?;

  let output = ws.ckrail(&[
    "sync",
    "forks",
    "--layer-list",
    &layers.to_string_lossy(),
    "--charm-list",
    &charms.to_string_lossy(),
    "--strict",
  ])?;

  assert_eq!(output.status.code(), Some(3));
  Ok(())
}

#[test]
fn test_sync_forks_merge_conflict_fails_only_that_fork() -> Result<()> {
  let ws = TestWorkspace::new()?;

  let conflict_up = ws.bare_repo("upstream-calico", &[])?;
  let conflict_down = ws.fork(&conflict_up, "calico")?;
  ws.push_commit(&conflict_up, "master", "README.md", "upstream wording\n")?;
  let diverged = ws.push_commit(&conflict_down, "master", "README.md", "downstream wording\n")?;

  let clean_up = ws.bare_repo("upstream-flannel", &[])?;
  let clean_down = ws.fork(&clean_up, "flannel")?;
  let clean_tip = ws.push_commit(&clean_up, "master", "CHANGES.md", "new upstream work\n")?;

  let charms = ws.write_list(
    "charms.yaml",
    &format!(
      "- calico:\n    upstream: {}\n    downstream: {}\n- flannel:\n    upstream: {}\n    downstream: {}\n",
      conflict_up.display(),
      conflict_down.display(),
      clean_up.display(),
      clean_down.display()
    ),
  )?;
  let layers = ws.write_list("layers.yaml", "[]\n")?;

  let output = ws.ckrail(&[
    "sync",
    "forks",
    "--layer-list",
    &layers.to_string_lossy(),
    "--charm-list",
    &charms.to_string_lossy(),
    "--jobs",
    "2",
    "--json",
    "--strict",
  ])?;
  assert_eq!(output.status.code(), Some(3));

  let report: serde_json::Value = serde_json::from_slice(&output.stdout)?;
  let outcomes = report["outcomes"].as_array().expect("outcomes array");
  let calico = outcomes
    .iter()
    .find(|o| o["item"] == "calico")
    .expect("calico outcome");
  assert_eq!(calico["status"], "failed");
  assert!(
    calico["error"].as_str().unwrap_or_default().contains("Merging upstream/master"),
    "error: {}",
    calico["error"]
  );
  let flannel = outcomes
    .iter()
    .find(|o| o["item"] == "flannel")
    .expect("flannel outcome");
  assert_eq!(flannel["status"], "done");

  // The conflicting fork is left as it was; the clean one caught up
  assert_eq!(rev(&conflict_down, "master")?, diverged);
  assert_eq!(rev(&clean_down, "master")?, clean_tip);
  Ok(())
}
