pub mod system_git;
mod system_git_ops;

pub use system_git::SystemGit;

/// Which ref namespace `ls-remote` lists
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefKind {
  Tags,
  Heads,
}

/// A ref advertised by a remote
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteRef {
  pub sha: String,
  /// Short name (`v1.14.0`, `master`)
  pub name: String,
}
