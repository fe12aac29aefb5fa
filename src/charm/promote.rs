//! Channel promotion
//!
//! Promotion replays what is published at one channel onto another: the
//! entity id and its resource revisions are read at the source channel and
//! released unchanged at the destination. Nothing is rebuilt.

use crate::charm::store::{ChannelResource, CharmStore};
use crate::core::error::RailResult;
use crate::core::exec::ToolRunner;
use serde::Serialize;
use tracing::info;

/// Everything needed to release an entity at a new channel
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PromotionPlan {
  pub entity: String,
  /// Revisioned id resolved at `from`
  pub id: String,
  pub from: String,
  pub to: String,
  pub resources: Vec<ChannelResource>,
}

impl PromotionPlan {
  /// Arguments of the `charm release` call this plan makes
  pub fn release_args(&self) -> Vec<String> {
    let mut args = vec!["release".to_string(), self.id.clone(), "--channel".to_string(), self.to.clone()];
    for resource in &self.resources {
      args.push("--resource".to_string());
      args.push(resource.release_arg());
    }
    args
  }
}

/// Read the entity id and resource set at `from`
///
/// No resources at `from` is logged and yields an empty set.
pub fn resolve_promotion(runner: &dyn ToolRunner, entity: &str, from: &str, to: &str) -> RailResult<PromotionPlan> {
  info!("Promoting :: {:^35} :: from:{} to: {}", entity, from, to);
  let store = CharmStore::new(runner);
  let id = store.show_id(entity, from)?;
  let resources = match store.list_resources(&id, from)? {
    Some(resources) => resources,
    None => {
      info!("No resources for {}", id);
      Vec::new()
    }
  };
  Ok(PromotionPlan {
    entity: entity.to_string(),
    id,
    from: from.to_string(),
    to: to.to_string(),
    resources,
  })
}

/// Release the resolved id at the destination channel
pub fn apply(runner: &dyn ToolRunner, plan: &PromotionPlan) -> RailResult<()> {
  CharmStore::new(runner).release(&plan.id, &plan.to, &plan.resources)
}

/// Promote every entity in order; the first failure aborts
///
/// Under `dry_run` plans are resolved and returned but nothing is released.
pub fn promote_all(
  runner: &dyn ToolRunner,
  entities: &[String],
  from: &str,
  to: &str,
  dry_run: bool,
) -> RailResult<Vec<PromotionPlan>> {
  let mut plans = Vec::with_capacity(entities.len());
  for entity in entities {
    let plan = resolve_promotion(runner, entity, from, to)?;
    if dry_run {
      info!("[dry-run] charm {}", plan.release_args().join(" "));
    } else {
      apply(runner, &plan)?;
    }
    plans.push(plan);
  }
  Ok(plans)
}
