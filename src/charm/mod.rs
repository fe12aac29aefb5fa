//! Charm store workflows
//!
//! - **store**: `charm` CLI client
//! - **container**: image pulls for oci-image resources
//! - **resources**: resource resolution and attachment
//! - **promote**: channel promotion
//! - **layers**: layer/interface source pulls
//! - **build**: charm and bundle build + publish

pub mod build;
pub mod container;
pub mod layers;
pub mod promote;
pub mod resources;
pub mod store;
