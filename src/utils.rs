//! Remote URL helpers
//!
//! Manifests name repositories as `org/repo` on the git host. Local paths and
//! full URLs are used as-is, which is how the integration tests point
//! workflows at scratch repositories.

use crate::core::config::GitCredentials;
use std::path::Path;
use url::Url;

/// Host that `org/repo` shorthands resolve against
pub const DEFAULT_GIT_HOST: &str = "github.com";

/// Check if a path is a local filesystem path (not a remote URL)
///
/// Absolute paths, `./` / `../` relative paths and `file://` URLs count as
/// local. `org/repo` shorthands do not.
pub fn is_local_path(path: &str) -> bool {
  if path.starts_with("./") || path.starts_with("../") || path.starts_with("file://") {
    return true;
  }
  if path.contains("://") || path.contains('@') {
    return false;
  }
  path.starts_with('/') || Path::new(path).is_absolute()
}

/// Turn a manifest `downstream` value into something `git clone` accepts
///
/// Shorthands become `https://<host>/<org>/<repo>`, with credentials
/// percent-encoded into the userinfo when provided.
pub fn resolve_remote(downstream: &str, credentials: Option<&GitCredentials>) -> String {
  if is_local_path(downstream) || downstream.contains("://") || downstream.contains('@') {
    return downstream.to_string();
  }

  let plain = format!("https://{}/{}", DEFAULT_GIT_HOST, downstream.trim_start_matches('/'));
  let Some(creds) = credentials else {
    return plain;
  };
  match Url::parse(&plain) {
    Ok(mut url) => {
      if url.set_username(&creds.username).is_err() || url.set_password(Some(&creds.password)).is_err() {
        return plain;
      }
      url.to_string()
    }
    Err(_) => plain,
  }
}

/// Strip any password from a URL before it is logged
pub fn redact_url(url: &str) -> String {
  match Url::parse(url) {
    Ok(mut parsed) if parsed.password().is_some() => {
      if parsed.set_password(Some("***")).is_err() {
        return "<redacted>".to_string();
      }
      parsed.to_string()
    }
    _ => url.to_string(),
  }
}

/// Whether `upstream` already is the `downstream` repository
///
/// Compares the URL path of `upstream` (without leading `/` and a trailing
/// `.git`) with the `org/repo` shorthand.
pub fn same_repository(upstream: &str, downstream: &str) -> bool {
  let normalize = |s: &str| s.trim_matches('/').trim_end_matches(".git").to_string();
  match Url::parse(upstream) {
    Ok(url) => normalize(url.path()) == normalize(downstream),
    Err(_) => normalize(upstream) == normalize(downstream),
  }
}
