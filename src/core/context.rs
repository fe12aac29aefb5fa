//! Run context - build once, pass everywhere
//!
//! `RunContext` bundles the environment-derived configuration with the
//! process runner used for `charm`, `docker` and `bash`. `main` builds it once
//! and every workflow takes it by reference.
//!
//! ```text
//! main.rs:
//!   RunContext::system(RailEnv::from_env()?) -> &RunContext
//!   |
//!   v
//! charm::build, upstream::forks, ...:
//!   fn run(ctx: &RunContext, ...)
//! ```

use crate::core::config::RailEnv;
use crate::core::error::RailResult;
use crate::core::exec::{SystemRunner, ToolRunner};
use crate::core::workdir::WorkDir;
use crate::utils;
use std::sync::Arc;

/// Shared state for one invocation
#[derive(Clone)]
pub struct RunContext {
  pub env: RailEnv,
  runner: Arc<dyn ToolRunner>,
}

impl RunContext {
  pub fn new(env: RailEnv, runner: Arc<dyn ToolRunner>) -> Self {
    Self { env, runner }
  }

  /// Context that spawns real processes
  pub fn system(env: RailEnv) -> Self {
    Self::new(env, Arc::new(SystemRunner))
  }

  pub fn runner(&self) -> &dyn ToolRunner {
    self.runner.as_ref()
  }

  /// Clone/push URL for a manifest `downstream` value, with credentials
  pub fn remote(&self, downstream: &str) -> String {
    utils::resolve_remote(downstream, self.env.credentials.as_ref())
  }

  /// Fresh transient directory name under the workspace
  pub fn reserve_workdir(&self) -> RailResult<WorkDir> {
    WorkDir::reserve(self.env.ensure_workspace()?)
  }

  /// Fresh, created, empty transient directory under the workspace
  pub fn create_workdir(&self) -> RailResult<WorkDir> {
    WorkDir::create(self.env.ensure_workspace()?)
  }
}
