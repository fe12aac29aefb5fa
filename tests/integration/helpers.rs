//! Shared helpers for integration tests
//!
//! Every test works against bare repositories in a scratch directory, so no
//! network access or credentials are needed.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

/// Scratch area holding bare "remote" repositories and the run workspace
pub struct TestWorkspace {
  #[allow(dead_code)]
  pub temp_dir: TempDir,
  pub root: PathBuf,
}

impl TestWorkspace {
  pub fn new() -> Result<Self> {
    let temp_dir = TempDir::new()?;
    let root = temp_dir.path().to_path_buf();
    std::fs::create_dir_all(root.join("remotes"))?;
    std::fs::create_dir_all(root.join("workspace"))?;
    std::fs::create_dir_all(root.join("lists"))?;
    Ok(Self { temp_dir, root })
  }

  /// Directory used as `WORKSPACE` for ckrail runs
  pub fn workspace(&self) -> PathBuf {
    self.root.join("workspace")
  }

  /// Create a bare repository `remotes/<name>.git` whose `master` has one
  /// commit, plus every branch in `branches` pointing at the same commit
  pub fn bare_repo(&self, name: &str, branches: &[&str]) -> Result<PathBuf> {
    let seed = self.root.join("seed").join(name);
    std::fs::create_dir_all(&seed)?;
    git(&seed, &["init", "-q"])?;
    git(&seed, &["checkout", "-q", "-b", "master"])?;
    std::fs::write(seed.join("README.md"), format!("# {}\n", name))?;
    git(&seed, &["add", "."])?;
    git(&seed, &["commit", "-q", "-m", "Initial commit"])?;
    for branch in branches {
      git(&seed, &["branch", branch])?;
    }

    let bare = self.root.join("remotes").join(format!("{}.git", name));
    git(
      &self.root,
      &["clone", "-q", "--bare", &seed.to_string_lossy(), &bare.to_string_lossy()],
    )?;
    Ok(bare)
  }

  /// Bare copy of another bare repository, sharing its history
  pub fn fork(&self, upstream: &Path, name: &str) -> Result<PathBuf> {
    let bare = self.root.join("remotes").join(format!("{}.git", name));
    git(
      &self.root,
      &["clone", "-q", "--bare", &upstream.to_string_lossy(), &bare.to_string_lossy()],
    )?;
    Ok(bare)
  }

  /// Commit a file on `branch` of a bare repository through a throwaway clone
  pub fn push_commit(&self, bare: &Path, branch: &str, file: &str, body: &str) -> Result<String> {
    let scratch = TempDir::new()?;
    let clone = scratch.path().join("c");
    git(
      scratch.path(),
      &["clone", "-q", "--branch", branch, &bare.to_string_lossy(), &clone.to_string_lossy()],
    )?;
    std::fs::write(clone.join(file), body)?;
    git(&clone, &["add", "."])?;
    git(&clone, &["commit", "-q", "-m", &format!("Update {}", file)])?;
    git(&clone, &["push", "-q", "origin", branch])?;
    rev(bare, branch)
  }

  /// Add a lightweight tag on `master` of a bare repository
  pub fn tag(&self, bare: &Path, tag: &str) -> Result<()> {
    git(bare, &["tag", tag, "master"])?;
    Ok(())
  }

  /// Write a YAML list under `lists/`
  pub fn write_list(&self, name: &str, body: &str) -> Result<PathBuf> {
    let path = self.root.join("lists").join(name);
    std::fs::write(&path, body)?;
    Ok(path)
  }

  /// Run ckrail with `WORKSPACE` pointed at the scratch workspace
  pub fn ckrail(&self, args: &[&str]) -> Result<Output> {
    run_ckrail(&self.root, args, &[("WORKSPACE", &self.workspace().to_string_lossy())])
  }
}

/// Run a git command with a fixed test identity
pub fn git(cwd: &Path, args: &[&str]) -> Result<Output> {
  let output = Command::new("git")
    .current_dir(cwd)
    .args(["-c", "user.name=Test User", "-c", "user.email=test@example.com"])
    .args(["-c", "init.defaultBranch=master", "-c", "commit.gpgsign=false"])
    .args(args)
    .output()
    .context("Failed to run git command")?;

  if !output.status.success() {
    let stderr = String::from_utf8_lossy(&output.stderr);
    anyhow::bail!("Git command failed: git {}\n{}", args.join(" "), stderr);
  }

  Ok(output)
}

/// Resolve a revision in a repository
pub fn rev(repo: &Path, rev: &str) -> Result<String> {
  let output = git(repo, &["rev-parse", rev])?;
  Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

/// Branch or tag names present in a repository
pub fn refs(repo: &Path, kind: &str) -> Result<Vec<String>> {
  let output = git(repo, &["for-each-ref", "--format=%(refname:short)", kind])?;
  Ok(
    String::from_utf8_lossy(&output.stdout)
      .lines()
      .map(str::to_string)
      .collect(),
  )
}

/// Run the ckrail binary without judging its exit status
///
/// Charm directory variables are cleared so each test opts in to them.
pub fn run_ckrail(cwd: &Path, args: &[&str], env: &[(&str, &str)]) -> Result<Output> {
  let bin = env!("CARGO_BIN_EXE_ckrail");

  let mut cmd = Command::new(bin);
  cmd
    .current_dir(cwd)
    .args(args)
    .env_remove("CHARM_BUILD_DIR")
    .env_remove("CHARM_LAYERS_DIR")
    .env_remove("CHARM_INTERFACES_DIR")
    .env_remove("CDKBOT_GH_USR")
    .env_remove("CDKBOT_GH_PSW")
    .env("RUST_LOG", "warn");
  for (key, value) in env {
    cmd.env(key, value);
  }
  cmd.output().context("Failed to run ckrail")
}

/// Assert success and hand back stdout
pub fn expect_success(output: &Output) -> Result<String> {
  if !output.status.success() {
    anyhow::bail!(
      "ckrail failed ({:?})\nstdout: {}\nstderr: {}",
      output.status.code(),
      String::from_utf8_lossy(&output.stdout),
      String::from_utf8_lossy(&output.stderr)
    );
  }
  Ok(String::from_utf8_lossy(&output.stdout).to_string())
}

/// Install a fake `charm` executable in `<root>/bin`
///
/// Every call is appended to `<root>/charm.log`. `show` reports revision 12
/// of the entity and `list-resources` reports one resource at revision 3.
#[cfg(unix)]
pub fn install_fake_charm(ws: &TestWorkspace) -> Result<PathBuf> {
  use std::os::unix::fs::PermissionsExt;

  let bin = ws.root.join("bin");
  std::fs::create_dir_all(&bin)?;
  let log = ws.root.join("charm.log");
  let script = format!(
    r#"#!/bin/sh
echo "$@" >> "{log}"
case "$1" in
  show)
    printf 'id:\n  Id: %s-12\n' "$2"
    ;;
  list-resources)
    printf -- '- name: flannel-amd64\n  revision: 3\n'
    ;;
esac
exit 0
"#,
    log = log.display()
  );
  let path = bin.join("charm");
  std::fs::write(&path, script)?;
  std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755))?;
  Ok(bin)
}

/// Lines the fake `charm` recorded
pub fn charm_calls(ws: &TestWorkspace) -> Result<Vec<String>> {
  let log = ws.root.join("charm.log");
  if !log.exists() {
    return Ok(Vec::new());
  }
  Ok(std::fs::read_to_string(log)?.lines().map(str::to_string).collect())
}

/// `PATH` with `bin` in front
pub fn path_with(bin: &Path) -> String {
  match std::env::var("PATH") {
    Ok(path) => format!("{}:{}", bin.display(), path),
    Err(_) => bin.display().to_string(),
  }
}
