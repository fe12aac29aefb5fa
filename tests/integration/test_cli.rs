//! Exit codes and argument handling of the ckrail binary

use crate::helpers::*;
use anyhow::Result;

#[test]
fn test_version_flag() -> Result<()> {
  let ws = TestWorkspace::new()?;
  let output = run_ckrail(&ws.root, &["--version"], &[])?;
  let stdout = expect_success(&output)?;
  assert!(stdout.starts_with("ckrail "));
  Ok(())
}

#[test]
fn test_build_without_charm_dirs_is_user_error() -> Result<()> {
  let ws = TestWorkspace::new()?;
  let empty = ws.write_list("empty.yaml", "[]\n")?;
  let empty = empty.to_string_lossy();

  let output = ws.ckrail(&[
    "charm",
    "build",
    "--charm-list",
    &empty,
    "--layer-list",
    &empty,
    "--layer-index",
    "https://charmed-kubernetes.github.io/layer-index/",
    "--resource-spec",
    &empty,
    "--bundle-list",
    &empty,
    "--filter-by-tag",
    "k8s",
    "--dry-run",
  ])?;

  assert_eq!(output.status.code(), Some(1));
  let stderr = String::from_utf8_lossy(&output.stderr);
  assert!(stderr.contains("CHARM_BUILD_DIR"), "stderr: {}", stderr);
  Ok(())
}

#[test]
fn test_build_requires_tag_filter() -> Result<()> {
  let ws = TestWorkspace::new()?;
  let empty = ws.write_list("empty.yaml", "[]\n")?;
  let empty = empty.to_string_lossy();

  let output = ws.ckrail(&[
    "charm",
    "build",
    "--charm-list",
    &empty,
    "--layer-list",
    &empty,
    "--layer-index",
    "https://example.invalid/",
    "--resource-spec",
    &empty,
    "--bundle-list",
    &empty,
  ])?;

  assert!(!output.status.success());
  Ok(())
}

#[test]
fn test_malformed_list_is_user_error() -> Result<()> {
  let ws = TestWorkspace::new()?;
  let broken = ws.write_list("broken.yaml", "- etcd:\n    tags: [k8s]\n")?;
  let empty = ws.write_list("empty.yaml", "[]\n")?;

  let output = ws.ckrail(&[
    "sync",
    "forks",
    "--layer-list",
    &empty.to_string_lossy(),
    "--charm-list",
    &broken.to_string_lossy(),
  ])?;

  assert_eq!(output.status.code(), Some(1));
  let stderr = String::from_utf8_lossy(&output.stderr);
  assert!(stderr.contains("downstream"), "stderr: {}", stderr);
  Ok(())
}

#[test]
fn test_bad_starting_semver_is_user_error() -> Result<()> {
  let ws = TestWorkspace::new()?;
  let output = ws.ckrail(&[
    "sync",
    "tags",
    "--upstream",
    "/nonexistent/up",
    "--downstream",
    "/nonexistent/down",
    "--starting-semver",
    "one.two",
  ])?;

  assert_eq!(output.status.code(), Some(1));
  Ok(())
}
