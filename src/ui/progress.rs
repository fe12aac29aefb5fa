//! Progress indicators for batch operations
//!
//! Uses `linya` for allocation-free, concurrency-optimized progress bars.
//! One bar per batch, ticked from worker threads.

use linya::{Bar, Progress};
use std::sync::{Arc, Mutex};

/// Thread-safe single-bar progress for fan-out batches
#[derive(Clone)]
pub struct BatchProgress {
  progress: Arc<Mutex<Progress>>,
  bar: Arc<Bar>,
}

impl BatchProgress {
  /// Create a new progress bar for `total` items
  pub fn new(total: usize, label: impl Into<String>) -> Self {
    let mut progress = Progress::new();
    let bar = progress.bar(total, label.into());
    Self {
      progress: Arc::new(Mutex::new(progress)),
      bar: Arc::new(bar),
    }
  }

  /// Increment by one finished item (thread-safe)
  pub fn inc(&self) {
    if let Ok(mut progress) = self.progress.lock() {
      progress.inc_and_draw(&self.bar, 1);
    }
  }
}
