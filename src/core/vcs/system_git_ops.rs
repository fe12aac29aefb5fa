//! Additional operations for SystemGit (remotes, branches, merges, tags)

use super::system_git::{SystemGit, base_cmd, redact_text};
use super::{RefKind, RemoteRef};
use crate::core::config::GitIdentity;
use crate::core::error::{GitError, RailError, RailResult, ResultExt};
use crate::utils::redact_url;

impl SystemGit {
  /// Set a repository-local config value
  pub fn set_config(&self, key: &str, value: &str) -> RailResult<()> {
    self.run(&["config", key, value]).map(|_| ())
  }

  /// Committer identity and push behaviour for a transient clone
  pub fn configure_identity(&self, identity: &GitIdentity) -> RailResult<()> {
    self.set_config("user.email", &identity.email)?;
    self.set_config("user.name", &identity.name)?;
    self.set_config("push.default", "simple")
  }

  /// Add a remote repository
  pub fn add_remote(&self, name: &str, url: &str) -> RailResult<()> {
    let output = self
      .git_cmd()
      .args(["remote", "add", name, url])
      .output()
      .context("Failed to add remote")?;

    if !output.status.success() {
      let stderr = String::from_utf8_lossy(&output.stderr);
      if stderr.contains("already exists") {
        return Ok(()); // Remote exists, not an error
      }
      return Err(RailError::Git(GitError::CommandFailed {
        command: format!("git remote add {} {}", name, redact_url(url)),
        stderr: redact_text(&stderr, url),
      }));
    }

    Ok(())
  }

  /// Fetch from remote
  pub fn fetch(&self, remote: &str) -> RailResult<()> {
    tracing::debug!("Fetching from remote '{}'", remote);
    self.run(&["fetch", remote]).map(|_| ())
  }

  /// Fetch a single refspec from a remote
  pub fn fetch_refspec(&self, remote: &str, refspec: &str) -> RailResult<()> {
    self.run(&["fetch", "--no-tags", remote, refspec]).map(|_| ())
  }

  /// Checkout a branch, optionally discarding local changes
  pub fn checkout(&self, branch: &str, force: bool) -> RailResult<()> {
    if force {
      self.run(&["checkout", "-f", branch]).map(|_| ())
    } else {
      self.run(&["checkout", branch]).map(|_| ())
    }
  }

  /// Create a branch at `start_point` without checking it out
  pub fn create_branch(&self, name: &str, start_point: &str) -> RailResult<()> {
    self.run(&["branch", name, start_point]).map(|_| ())
  }

  /// Merge `source` into the checked out branch
  ///
  /// A conflict leaves the working copy mid-merge; callers throw the clone
  /// away.
  pub fn merge(&self, source: &str, no_ff: bool) -> RailResult<()> {
    let mut args = vec!["merge", "--no-edit"];
    if no_ff {
      args.push("--no-ff");
    }
    args.push(source);

    let output = self.git_cmd().args(&args).output().context("Failed to merge")?;

    if !output.status.success() {
      let target = self.current_branch().unwrap_or_else(|_| "HEAD".to_string());
      let mut detail = String::from_utf8_lossy(&output.stderr).to_string();
      if detail.trim().is_empty() {
        detail = String::from_utf8_lossy(&output.stdout).to_string();
      }
      return Err(RailError::Git(GitError::MergeFailed {
        target,
        source: source.to_string(),
        stderr: detail,
      }));
    }

    Ok(())
  }

  /// Get current branch name
  pub fn current_branch(&self) -> RailResult<String> {
    self.run(&["rev-parse", "--abbrev-ref", "HEAD"])
  }

  /// Create or move a lightweight tag at HEAD
  pub fn tag(&self, name: &str, force: bool) -> RailResult<()> {
    if force {
      self.run(&["tag", "--force", name]).map(|_| ())
    } else {
      self.run(&["tag", name]).map(|_| ())
    }
  }

  /// Push a refspec to a remote
  pub fn push(&self, remote: &str, refspec: &str, force: bool) -> RailResult<()> {
    tracing::info!("Pushing {} to '{}'", refspec, redact_url(remote));

    let mut args = vec!["push"];
    if force {
      args.push("--force");
    }
    args.push(remote);
    args.push(refspec);

    let output = self.git_cmd().args(&args).output().context("Failed to push")?;

    if !output.status.success() {
      let stderr = String::from_utf8_lossy(&output.stderr);
      return Err(RailError::Git(GitError::PushFailed {
        remote: redact_url(remote),
        refspec: refspec.to_string(),
        reason: redact_text(&stderr, remote),
      }));
    }

    Ok(())
  }

  /// List refs of a remote repository without cloning it
  ///
  /// Peeled tag entries (`^{}`) are dropped.
  pub fn ls_remote(url: &str, kind: RefKind) -> RailResult<Vec<RemoteRef>> {
    let flag = match kind {
      RefKind::Tags => "--tags",
      RefKind::Heads => "--heads",
    };

    let output = base_cmd()
      .args(["ls-remote", flag, url])
      .output()
      .context("Failed to execute git ls-remote")?;

    if !output.status.success() {
      return Err(RailError::Git(GitError::CommandFailed {
        command: format!("git ls-remote {} {}", flag, redact_url(url)),
        stderr: redact_text(&String::from_utf8_lossy(&output.stderr), url),
      }));
    }

    Ok(parse_ls_remote(&String::from_utf8_lossy(&output.stdout), kind))
  }
}

/// Parse `git ls-remote` output into short ref names
///
/// Format: `<sha>\trefs/tags/v1.14.0`
pub(crate) fn parse_ls_remote(stdout: &str, kind: RefKind) -> Vec<RemoteRef> {
  let prefix = match kind {
    RefKind::Tags => "refs/tags/",
    RefKind::Heads => "refs/heads/",
  };

  stdout
    .lines()
    .filter_map(|line| {
      let (sha, full) = line.split_once('\t')?;
      let name = full.trim().strip_prefix(prefix)?;
      if name.ends_with("^{}") {
        return None;
      }
      Some(RemoteRef {
        sha: sha.trim().to_string(),
        name: name.to_string(),
      })
    })
    .collect()
}
