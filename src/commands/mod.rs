//! CLI commands for ckrail
//!
//! Each command loads its manifests, runs one workflow and prints the
//! collected outcomes.
//!
//! ## Charm store
//! - **pull-layers**: fetch layer and interface sources
//! - **build**: build, push and promote charms and bundles
//! - **promote**: replay one channel onto another
//! - **resource**: build and attach charm resources
//!
//! ## Releases
//! - **cut-stable**: merge master into stable
//! - **tag-stable**: tag stable branches with a bundle revision
//!
//! ## Upstream sync
//! - **forks**, **tags**, **snaps**, **debs**
//!
//! All commands take the `&RunContext` built once in `main`.

pub mod charm;
pub mod release;
pub mod sync;

pub use charm::{run_build, run_promote, run_pull_layers, run_resource};
pub use release::{run_cut_stable, run_tag_stable};
pub use sync::{run_sync_forks, run_sync_packages, run_sync_tags};
