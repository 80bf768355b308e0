//! Contract checks over the raw observation log.
//!
//! Works on untyped records so a missing or mistyped field is reported as a
//! violation rather than silently skipped.

use std::fmt;

use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InvariantStatus {
    Clean,
    Violated,
    NoData,
}

impl InvariantStatus {
    /// 0 clean, 1 no data, 2 violated.
    pub fn exit_code(self) -> i32 {
        match self {
            InvariantStatus::Clean => 0,
            InvariantStatus::NoData => 1,
            InvariantStatus::Violated => 2,
        }
    }

    pub fn is_clean(self) -> bool {
        self == InvariantStatus::Clean
    }
}

impl fmt::Display for InvariantStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            InvariantStatus::Clean => "CLEAN",
            InvariantStatus::Violated => "VIOLATED",
            InvariantStatus::NoData => "NO DATA",
        })
    }
}

type Rule = fn(&Value) -> bool;

pub static INVARIANTS: [(&str, Rule); 5] = [
    ("entropy_bound", |e| unit_bound(e, "entropy")),
    ("mean_entropy_bound", |e| unit_bound(e, "mean_entropy")),
    ("dampening_range", |e| e.get("dampening").and_then(Value::as_f64).is_some_and(|d| d > 0.0 && d <= 1.0)),
    ("no_identity_write", |e| e.get("identity_pressure").is_some()),
    ("constraints_explicit", |e| e.get("active_constraints").is_some_and(Value::is_array)),
];

fn unit_bound(event: &Value, key: &str) -> bool {
    event.get(key).and_then(Value::as_f64).is_some_and(|v| (0.0..=1.0).contains(&v))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
    pub event: usize,
    pub invariant: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct InvariantReport {
    pub status: InvariantStatus,
    pub events_checked: usize,
    pub invariants: usize,
    pub violations: Vec<Violation>,
}

pub fn verify(events: &[Value]) -> InvariantReport {
    let violations: Vec<Violation> = events
        .iter()
        .enumerate()
        .flat_map(|(i, e)| {
            INVARIANTS
                .iter()
                .filter(move |(_, rule)| !rule(e))
                .map(move |(name, _)| Violation { event: i, invariant: *name })
        })
        .collect();

    let status = if events.is_empty() {
        InvariantStatus::NoData
    } else if violations.is_empty() {
        InvariantStatus::Clean
    } else {
        InvariantStatus::Violated
    };

    InvariantReport { status, events_checked: events.len(), invariants: INVARIANTS.len(), violations }
}
