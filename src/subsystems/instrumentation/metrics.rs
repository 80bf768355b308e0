//! Aggregate view over every recorded observation.

use serde::Serialize;

use super::log::Observation;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsSummary {
    pub observations: usize,
    pub avg_entropy: f64,
    pub avg_mean_entropy: f64,
    /// Fraction of observations with `stabilize` active.
    pub stabilization_rate: f64,
    pub avg_dampening: f64,
}

/// `None` when there is nothing to summarize.
pub fn summarize(events: &[Observation]) -> Option<MetricsSummary> {
    if events.is_empty() {
        return None;
    }
    let n = events.len() as f64;
    let stabilized = events.iter().filter(|e| e.is_stabilizing()).count();
    Some(MetricsSummary {
        observations: events.len(),
        avg_entropy: events.iter().map(|e| e.entropy).sum::<f64>() / n,
        avg_mean_entropy: events.iter().map(|e| e.mean_entropy).sum::<f64>() / n,
        stabilization_rate: stabilized as f64 / n,
        avg_dampening: events.iter().map(|e| e.dampening).sum::<f64>() / n,
    })
}

pub(crate) fn mean(values: &[f64]) -> f64 {
    if values.is_empty() { 0.0 } else { values.iter().sum::<f64>() / values.len() as f64 }
}
