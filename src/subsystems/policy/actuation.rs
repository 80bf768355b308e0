//! Dry-run actuation: what the system *would* do for a recommendation.

use super::Recommendation;

pub fn simulate(rec: Recommendation) -> &'static str {
    match rec {
        Recommendation::LowerEntropyMax => "SIMULATE: would decrease ENTROPY_MAX by 0.05",
        Recommendation::ReviewInputPatterns => "SIMULATE: would flag input sources for review",
        Recommendation::RelaxDampening => "SIMULATE: would relax dampening slope slightly",
        Recommendation::WithinBounds => "NO ACTION: system stable",
        Recommendation::CollectMoreObservations => "UNKNOWN RECOMMENDATION",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_recommendation_maps() {
        assert_eq!(simulate(Recommendation::LowerEntropyMax), "SIMULATE: would decrease ENTROPY_MAX by 0.05");
        assert_eq!(simulate(Recommendation::WithinBounds), "NO ACTION: system stable");
        assert_eq!(simulate(Recommendation::CollectMoreObservations), "UNKNOWN RECOMMENDATION");
    }
}
