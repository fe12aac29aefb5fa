//! External tool invocation
//!
//! Every non-git process (`charm`, `docker`, `bash`) goes through the
//! `ToolRunner` trait so workflows can be driven by a recording fake in tests.

use crate::core::error::{RailError, RailResult, ResultExt, ToolError};
use std::path::{Path, PathBuf};
use std::process::Command;

/// A fully described external command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCommand {
  pub program: String,
  pub args: Vec<String>,
  pub cwd: Option<PathBuf>,
  /// Log output lines at info instead of debug
  pub echo: bool,
}

impl ToolCommand {
  pub fn new(program: impl Into<String>) -> Self {
    Self {
      program: program.into(),
      args: Vec::new(),
      cwd: None,
      echo: false,
    }
  }

  pub fn arg(mut self, arg: impl Into<String>) -> Self {
    self.args.push(arg.into());
    self
  }

  pub fn args<I, S>(mut self, args: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    self.args.extend(args.into_iter().map(Into::into));
    self
  }

  pub fn current_dir(mut self, dir: impl AsRef<Path>) -> Self {
    self.cwd = Some(dir.as_ref().to_path_buf());
    self
  }

  /// Echo output lines at the default log level
  pub fn echo(mut self) -> Self {
    self.echo = true;
    self
  }

  /// Command line as a single string, for logs and errors
  pub fn display(&self) -> String {
    let mut out = self.program.clone();
    for arg in &self.args {
      out.push(' ');
      out.push_str(arg);
    }
    out
  }
}

/// Captured result of a finished process
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolOutput {
  /// Exit code, `None` when killed by a signal
  pub status: Option<i32>,
  pub stdout: String,
  pub stderr: String,
}

impl ToolOutput {
  pub fn success(&self) -> bool {
    self.status == Some(0)
  }
}

/// Seam between the orchestration logic and the processes it drives
pub trait ToolRunner: Send + Sync {
  /// Run to completion and capture output, whatever the exit status
  fn output(&self, cmd: &ToolCommand) -> RailResult<ToolOutput>;

  /// Run and fail on a non-zero exit
  fn run(&self, cmd: &ToolCommand) -> RailResult<ToolOutput> {
    let out = self.output(cmd)?;
    if !out.success() {
      return Err(RailError::Tool(ToolError {
        command: cmd.display(),
        status: out.status,
        stderr: if out.stderr.trim().is_empty() {
          out.stdout.clone()
        } else {
          out.stderr.clone()
        },
      }));
    }
    Ok(out)
  }
}

/// Runs commands as real subprocesses
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl ToolRunner for SystemRunner {
  fn output(&self, cmd: &ToolCommand) -> RailResult<ToolOutput> {
    tracing::debug!(command = %cmd.display(), "spawning");

    let mut command = Command::new(&cmd.program);
    command.args(&cmd.args);
    if let Some(cwd) = &cmd.cwd {
      command.current_dir(cwd);
    }

    let output = command
      .output()
      .with_context(|| format!("Failed to execute {}", cmd.program))?;

    let out = ToolOutput {
      status: output.status.code(),
      stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
      stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    };

    for line in out.stdout.lines().chain(out.stderr.lines()) {
      let line = line.trim();
      if line.is_empty() {
        continue;
      }
      if cmd.echo {
        tracing::info!(program = %cmd.program, " -- {}", line);
      } else {
        tracing::debug!(program = %cmd.program, " -- {}", line);
      }
    }

    Ok(out)
  }
}
