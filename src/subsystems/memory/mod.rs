//! Memory: nothing is remembered implicitly.
//!
//! - **ttl**: in-process entries that carry a reason and an expiry.
//! - **capture**: operator-invoked snapshots appended to the capture log.

pub mod capture;
pub mod ttl;

pub use capture::{capture, CaptureOutcome};
pub use ttl::{MemoryEntry, TtlMemory};
