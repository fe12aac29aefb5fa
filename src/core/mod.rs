//! Core building blocks shared by every workflow
//!
//! - **config**: environment-derived run configuration (`RailEnv`)
//! - **context**: per-invocation context handed to workflows
//! - **error**: error types with exit codes and help messages
//! - **exec**: external tool seam (`ToolRunner`)
//! - **fanout**: bounded parallel batch runner with collected outcomes
//! - **manifest**: typed YAML manifests and the tag filter
//! - **retry**: fixed-delay bounded retry
//! - **vcs**: git operations (SystemGit)
//! - **workdir**: uniquely named transient directories

pub mod config;
pub mod context;
pub mod error;
pub mod exec;
pub mod fanout;
pub mod manifest;
pub mod retry;
pub mod vcs;
pub mod workdir;
