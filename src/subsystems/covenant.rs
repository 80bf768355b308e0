//! Constraints the system holds itself to, printed by `elyria-cp covenant`.

pub const COVENANT: [(&str, bool); 6] = [
    ("no_implicit_memory", true),
    ("no_background_capture", true),
    ("no_unconsented_execution", true),
    ("no_identity_claims", true),
    ("no_inference_of_user_state", true),
    ("no_goal_generation", true),
];

pub const NOTES: [(&str, &str); 3] = [
    ("author_intent", "Stability before capability."),
    ("design_principle", "Consent over cleverness."),
    ("status", "Active unless explicitly revised by human."),
];

pub fn holds() -> bool {
    COVENANT.iter().all(|(_, v)| *v)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_clause_holds() {
        assert!(holds());
        assert_eq!(COVENANT.len(), 6);
    }
}
