//! Container image pulls for oci-image resources

use crate::core::error::RailResult;
use crate::core::exec::{ToolCommand, ToolRunner};

/// `docker pull <image>`; a failed pull is fatal, no retry
pub fn pull_image(runner: &dyn ToolRunner, image: &str) -> RailResult<()> {
  tracing::info!("Pulling {}...", image);
  runner.run(&ToolCommand::new("docker").args(["pull", image]))?;
  Ok(())
}
