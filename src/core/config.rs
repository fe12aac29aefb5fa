//! Run configuration derived from the process environment
//!
//! `RailEnv` is built exactly once in `main` and passed by reference into
//! every workflow. Nothing below `main` reads the environment directly.

use crate::core::error::{ConfigError, RailError, RailResult};
use std::path::{Path, PathBuf};

pub const ENV_BUILD_DIR: &str = "CHARM_BUILD_DIR";
pub const ENV_LAYERS_DIR: &str = "CHARM_LAYERS_DIR";
pub const ENV_INTERFACES_DIR: &str = "CHARM_INTERFACES_DIR";
pub const ENV_WORKSPACE: &str = "WORKSPACE";
pub const ENV_GIT_USER: &str = "CDKBOT_GH_USR";
pub const ENV_GIT_PASSWORD: &str = "CDKBOT_GH_PSW";

/// Directories the charm tooling builds into and pulls layers into
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CharmDirs {
  pub build_dir: PathBuf,
  pub layers_dir: PathBuf,
  pub interfaces_dir: PathBuf,
}

/// Credentials embedded into https push URLs
#[derive(Clone, PartialEq, Eq)]
pub struct GitCredentials {
  pub username: String,
  pub password: String,
}

// Never print the password.
impl std::fmt::Debug for GitCredentials {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("GitCredentials")
      .field("username", &self.username)
      .field("password", &"***")
      .finish()
  }
}

/// Committer identity written into every transient clone
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitIdentity {
  pub name: String,
  pub email: String,
}

impl Default for GitIdentity {
  fn default() -> Self {
    Self {
      name: "cdkbot".to_string(),
      email: "cdkbot@juju.solutions".to_string(),
    }
  }
}

/// Everything a run needs from its environment
#[derive(Debug, Clone)]
pub struct RailEnv {
  charm_dirs: Option<CharmDirs>,
  missing: Vec<String>,
  /// Parent directory of transient clones
  pub workspace_dir: PathBuf,
  pub credentials: Option<GitCredentials>,
  pub identity: GitIdentity,
}

impl RailEnv {
  /// Build from the real process environment
  pub fn from_env() -> RailResult<Self> {
    let cwd = std::env::current_dir()?;
    let mut env = Self::from_lookup(|name| std::env::var(name).ok(), &cwd);
    // Builder scripts run with a different cwd
    env.workspace_dir = std::path::absolute(&env.workspace_dir)?;
    Ok(env)
  }

  /// Build from an arbitrary variable lookup
  ///
  /// Missing charm directories are remembered rather than reported here, so
  /// sync commands can run without them; `require_charm_dirs` reports them.
  /// `WORKSPACE` falls back to `fallback_workspace`.
  pub fn from_lookup<F>(lookup: F, fallback_workspace: &Path) -> Self
  where
    F: Fn(&str) -> Option<String>,
  {
    let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

    let mut missing = Vec::new();
    let mut dir = |name: &str| match get(name) {
      Some(v) => Some(PathBuf::from(v)),
      None => {
        missing.push(name.to_string());
        None
      }
    };

    let build_dir = dir(ENV_BUILD_DIR);
    let layers_dir = dir(ENV_LAYERS_DIR);
    let interfaces_dir = dir(ENV_INTERFACES_DIR);
    let workspace = dir(ENV_WORKSPACE);

    let charm_dirs = match (build_dir, layers_dir, interfaces_dir) {
      (Some(build_dir), Some(layers_dir), Some(interfaces_dir)) => Some(CharmDirs {
        build_dir,
        layers_dir,
        interfaces_dir,
      }),
      _ => None,
    };

    let credentials = match (get(ENV_GIT_USER), get(ENV_GIT_PASSWORD)) {
      (Some(username), Some(password)) => Some(GitCredentials { username, password }),
      _ => None,
    };

    Self {
      charm_dirs,
      missing,
      workspace_dir: workspace.unwrap_or_else(|| fallback_workspace.to_path_buf()),
      credentials,
      identity: GitIdentity::default(),
    }
  }

  /// Charm build directories, or a fatal configuration error naming every
  /// unset variable (including `WORKSPACE`, which charm builds require)
  pub fn require_charm_dirs(&self) -> RailResult<&CharmDirs> {
    match &self.charm_dirs {
      Some(dirs) if self.missing.is_empty() => Ok(dirs),
      _ => Err(RailError::Config(ConfigError::MissingEnv {
        names: self.missing.clone(),
      })),
    }
  }

  /// Make sure the workspace directory exists and is a directory
  pub fn ensure_workspace(&self) -> RailResult<&Path> {
    if self.workspace_dir.exists() && !self.workspace_dir.is_dir() {
      return Err(RailError::Config(ConfigError::Invalid {
        name: ENV_WORKSPACE.to_string(),
        reason: format!("{} is not a directory", self.workspace_dir.display()),
      }));
    }
    std::fs::create_dir_all(&self.workspace_dir)?;
    Ok(&self.workspace_dir)
  }
}
