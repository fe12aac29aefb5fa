//! Terminal output: log subscriber and batch progress bars

pub mod logging;
pub mod progress;
