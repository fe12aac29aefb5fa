//! Git-side release workflows
//!
//! - **forks**: merge upstream mainline into downstream forks (parallel)
//! - **stable**: cut and tag `stable` branches
//! - **tags**: propagate upstream release tags
//! - **packages**: snap / deb version branches

pub mod forks;
pub mod packages;
pub mod stable;
pub mod tags;
