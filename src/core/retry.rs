//! Fixed-delay bounded retry
//!
//! Used for layer pulls and resource attachment. `max_attempts` counts every
//! attempt including the first; after the last failed attempt the run is
//! aborted with `RailError::RetryExhausted`.

use crate::core::error::{RailError, RailResult};
use std::time::Duration;
use tracing::warn;

/// Bounded retry with a fixed sleep between attempts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
  pub max_attempts: u32,
  pub delay: Duration,
}

impl RetryPolicy {
  pub fn new(max_attempts: u32, delay: Duration) -> Self {
    Self {
      max_attempts: max_attempts.max(1),
      delay,
    }
  }

  /// `charm pull-source`: 15 attempts, 60 seconds apart
  pub fn layer_pull() -> Self {
    Self::new(15, Duration::from_secs(60))
  }

  /// `charm attach`: one attempt plus ten retries, back to back
  pub fn attach() -> Self {
    Self::new(11, Duration::ZERO)
  }
}

/// Run `op` until it succeeds or the policy is exhausted
pub fn retry<T, F>(policy: &RetryPolicy, operation: &str, mut op: F) -> RailResult<T>
where
  F: FnMut() -> RailResult<T>,
{
  let mut attempt = 0;
  loop {
    attempt += 1;
    match op() {
      Ok(value) => return Ok(value),
      Err(err) => {
        warn!("{}: problem: {}, retrying [{}/{}]", operation, err, attempt, policy.max_attempts);
        if attempt >= policy.max_attempts {
          return Err(RailError::RetryExhausted {
            operation: operation.to_string(),
            attempts: attempt,
            last_error: Box::new(err),
          });
        }
        if !policy.delay.is_zero() {
          std::thread::sleep(policy.delay);
        }
      }
    }
  }
}
