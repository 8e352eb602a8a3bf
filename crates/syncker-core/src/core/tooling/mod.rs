//! CLI-facing diagnostics, progress reporting, and outcome shaping.

pub mod diagnostics;
pub(crate) mod outcome;
pub mod progress;
