//! System git backend
//!
//! Every git operation shells out to the `git` binary with an isolated
//! environment. Command lines that may carry credentials are redacted before
//! they reach logs or errors.

use crate::core::error::{GitError, RailError, RailResult, ResultExt};
use crate::utils::redact_url;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Environment variables passed through to git
const PASSTHROUGH_ENV: &[&str] = &[
  "PATH",
  "HOME",
  "SSH_AUTH_SOCK",
  "http_proxy",
  "https_proxy",
  "no_proxy",
  "HTTP_PROXY",
  "HTTPS_PROXY",
  "NO_PROXY",
];

/// Git backend using system git
#[derive(Debug, Clone)]
pub struct SystemGit {
  /// Repository working directory
  pub(crate) repo_path: PathBuf,
}

impl SystemGit {
  /// Open an existing repository (bare or not)
  pub fn open(path: &Path) -> RailResult<Self> {
    let output = base_cmd()
      .arg("-C")
      .arg(path)
      .args(["rev-parse", "--git-dir"])
      .output()
      .context("Failed to execute git rev-parse")?;

    if !output.status.success() {
      return Err(RailError::Git(GitError::CommandFailed {
        command: format!("git -C {} rev-parse --git-dir", path.display()),
        stderr: String::from_utf8_lossy(&output.stderr).to_string(),
      }));
    }

    Ok(Self {
      repo_path: path.to_path_buf(),
    })
  }

  /// Clone `url` into `dest`, optionally checking out `branch`
  pub fn clone_into(url: &str, dest: &Path, branch: Option<&str>) -> RailResult<Self> {
    tracing::info!("Cloning {} into {}", redact_url(url), dest.display());

    let mut cmd = base_cmd();
    cmd.arg("clone");
    if let Some(branch) = branch {
      cmd.args(["--branch", branch]);
    }
    cmd.arg(url).arg(dest);

    let output = cmd.output().context("Failed to execute git clone")?;
    if !output.status.success() {
      return Err(RailError::Git(GitError::CloneFailed {
        url: redact_url(url),
        stderr: redact_text(&String::from_utf8_lossy(&output.stderr), url),
      }));
    }

    Ok(Self {
      repo_path: dest.to_path_buf(),
    })
  }

  /// Create an empty repository at `path`
  pub fn init(path: &Path) -> RailResult<Self> {
    let output = base_cmd()
      .arg("init")
      .arg(path)
      .output()
      .context("Failed to execute git init")?;

    if !output.status.success() {
      return Err(RailError::Git(GitError::CommandFailed {
        command: format!("git init {}", path.display()),
        stderr: String::from_utf8_lossy(&output.stderr).to_string(),
      }));
    }

    Ok(Self {
      repo_path: path.to_path_buf(),
    })
  }

  pub fn path(&self) -> &Path {
    &self.repo_path
  }

  /// Get HEAD commit SHA
  pub fn head_commit(&self) -> RailResult<String> {
    self.rev_parse("HEAD")
  }

  /// Resolve a revision to a full SHA
  pub fn rev_parse(&self, rev: &str) -> RailResult<String> {
    self.run(&["rev-parse", rev])
  }

  /// Run a git command in this repository and return trimmed stdout
  pub(crate) fn run(&self, args: &[&str]) -> RailResult<String> {
    let output = self.git_cmd().args(args).output().context("Failed to execute git")?;

    if !output.status.success() {
      let mut stderr = String::from_utf8_lossy(&output.stderr).to_string();
      for arg in args {
        stderr = redact_text(&stderr, arg);
      }
      let shown: Vec<String> = args.iter().map(|a| redact_url(a)).collect();
      return Err(RailError::Git(GitError::CommandFailed {
        command: format!("git {}", shown.join(" ")),
        stderr,
      }));
    }

    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
  }

  /// Create a safe git command bound to this repository
  pub(crate) fn git_cmd(&self) -> Command {
    let mut cmd = base_cmd();
    cmd.arg("-C").arg(&self.repo_path);
    cmd
  }
}

/// Git command with isolated environment and safe overrides
///
/// - Clears environment variables except a short whitelist
/// - Never prompts for credentials
/// - Never opens an editor
pub(crate) fn base_cmd() -> Command {
  let mut cmd = Command::new("git");

  cmd.env_clear();
  for name in PASSTHROUGH_ENV {
    if let Ok(value) = std::env::var(name) {
      cmd.env(name, value);
    }
  }
  cmd.env("GIT_TERMINAL_PROMPT", "0");
  cmd.env("GIT_EDITOR", "true");

  cmd.arg("-c").arg("advice.detachedHead=false");
  cmd.arg("-c").arg("core.quotePath=false");

  cmd
}

/// Replace the credentialed form of `url` inside `text`
pub(crate) fn redact_text(text: &str, url: &str) -> String {
  let redacted = redact_url(url);
  if redacted == url {
    text.to_string()
  } else {
    text.replace(url, &redacted)
  }
}
