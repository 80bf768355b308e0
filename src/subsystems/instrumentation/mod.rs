//! Instrumentation: read-only record of gate behavior and the views built
//! on top of it.
//!
//! - **log**: append-only observation JSONL.
//! - **metrics**: whole-log averages.
//! - **observability**: trends over the last [`observability::WINDOW`] events.
//! - **invariants**: contract verification with exit codes.

pub mod invariants;
pub mod log;
pub mod metrics;
pub mod observability;

pub use invariants::{InvariantReport, InvariantStatus};
pub use log::{Observation, ObservationLog};
