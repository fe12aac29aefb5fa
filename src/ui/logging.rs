//! Log subscriber setup
//!
//! Logs go to stderr so `--json` reports on stdout stay machine-readable.
//! `RUST_LOG` selects the filter, defaulting to `info`.

use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Install the global subscriber; later calls are no-ops
pub fn init() {
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
  let fmt_layer = fmt::layer().with_target(false).with_writer(std::io::stderr).compact();

  tracing_subscriber::registry().with(filter).with(fmt_layer).try_init().ok();
}
