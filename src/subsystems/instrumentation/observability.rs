//! Recent-behavior view: direction of travel over the last few observations.

use std::fmt;

use serde::Serialize;

use super::log::Observation;
use super::metrics::mean;

/// Observations considered by the view.
pub const WINDOW: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Trend {
    Up,
    Down,
    Flat,
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Trend::Up => "↑",
            Trend::Down => "↓",
            Trend::Flat => "→",
        })
    }
}

/// Compare the last value with the first.
pub fn trend(values: &[f64]) -> Trend {
    match (values.first(), values.last()) {
        (Some(first), Some(last)) if values.len() >= 2 => {
            if last > first {
                Trend::Up
            } else if last < first {
                Trend::Down
            } else {
                Trend::Flat
            }
        }
        _ => Trend::Flat,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ObservabilityView {
    pub events: usize,
    pub entropy_trend: Trend,
    pub mean_entropy_trend: Trend,
    pub dampening_trend: Trend,
    pub stabilizations: usize,
    pub avg_entropy: f64,
    pub avg_dampening: f64,
}

pub fn summarize(recent: &[Observation]) -> Option<ObservabilityView> {
    if recent.is_empty() {
        return None;
    }
    let entropies: Vec<f64> = recent.iter().map(|e| e.entropy).collect();
    let means: Vec<f64> = recent.iter().map(|e| e.mean_entropy).collect();
    let dampenings: Vec<f64> = recent.iter().map(|e| e.dampening).collect();
    Some(ObservabilityView {
        events: recent.len(),
        entropy_trend: trend(&entropies),
        mean_entropy_trend: trend(&means),
        dampening_trend: trend(&dampenings),
        stabilizations: recent.iter().filter(|e| e.is_stabilizing()).count(),
        avg_entropy: mean(&entropies),
        avg_dampening: mean(&dampenings),
    })
}
