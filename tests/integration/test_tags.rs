//! `ckrail sync tags` between local repositories

use crate::helpers::*;
use anyhow::Result;

#[test]
fn test_sync_tags_pushes_missing_release_tags() -> Result<()> {
  let ws = TestWorkspace::new()?;
  let upstream = ws.bare_repo("upstream-cni", &[])?;
  let downstream = ws.fork(&upstream, "cni")?;
  for tag in ["v1.13.0", "v1.14.0", "v1.15.2", "not-a-version"] {
    ws.tag(&upstream, tag)?;
  }
  ws.tag(&downstream, "v1.14.0")?;

  let output = ws.ckrail(&[
    "sync",
    "tags",
    "--upstream",
    &upstream.to_string_lossy(),
    "--downstream",
    &downstream.to_string_lossy(),
    "--starting-semver",
    "1.14.0",
    "--strict",
  ])?;
  expect_success(&output)?;

  let mut tags = refs(&downstream, "refs/tags")?;
  tags.sort();
  assert_eq!(tags, vec!["v1.14.0".to_string(), "v1.15.2".to_string()]);
  Ok(())
}

#[test]
fn test_sync_tags_dry_run_pushes_nothing() -> Result<()> {
  let ws = TestWorkspace::new()?;
  let upstream = ws.bare_repo("upstream-cni", &[])?;
  let downstream = ws.fork(&upstream, "cni")?;
  ws.tag(&upstream, "v1.16.0")?;

  let output = ws.ckrail(&[
    "sync",
    "tags",
    "--upstream",
    &upstream.to_string_lossy(),
    "--downstream",
    &downstream.to_string_lossy(),
    "--dry-run",
    "--json",
  ])?;
  let stdout = expect_success(&output)?;

  let report: serde_json::Value = serde_json::from_str(&stdout)?;
  assert_eq!(report["outcomes"][0]["item"], "v1.16.0");
  assert_eq!(report["outcomes"][0]["status"], "skipped");
  assert!(refs(&downstream, "refs/tags")?.is_empty());
  Ok(())
}
