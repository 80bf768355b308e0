//! Per-turn coherence (Kₜ) and recursion (Rₜ) estimates.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

static WORD_RE: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"\w+").ok());

const SELF_REFERENCES: [&str; 3] = ["again", "repeat", "as i said"];

pub fn clamp01(x: f64) -> f64 {
    x.clamp(0.0, 1.0)
}

/// `true` when some word appears at least three times in a row, separated
/// only by whitespace. Case-insensitive.
pub fn has_word_run(text: &str) -> bool {
    let Some(re) = WORD_RE.as_ref() else {
        return false;
    };
    let lower = text.to_lowercase();
    let mut prev: Option<(&str, usize)> = None;
    let mut run = 0;
    for m in re.find_iter(&lower) {
        let word = m.as_str();
        run = match prev {
            Some((p, end)) if p == word && is_blank_gap(&lower[end..m.start()]) => run + 1,
            _ => 1,
        };
        if run >= 3 {
            return true;
        }
        prev = Some((word, m.end()));
    }
    false
}

fn is_blank_gap(gap: &str) -> bool {
    !gap.is_empty() && gap.chars().all(char::is_whitespace)
}

/// Rₜ: word runs and explicit self-references push recursion up.
pub fn estimate_recursion(text: &str) -> f64 {
    let lower = text.to_lowercase();
    let repeats = if has_word_run(&lower) { 1.0 } else { 0.0 };
    let self_ref: usize = SELF_REFERENCES.iter().map(|p| lower.matches(p).count()).sum();
    clamp01(0.6 * repeats + 0.1 * self_ref as f64)
}

/// Kₜ: closure and length raise coherence; overlap with the previous turn
/// and word runs lower it. `last_tokens` carries the previous turn's token
/// set and is replaced with this turn's. Blank text scores 0 and leaves it
/// untouched.
pub fn estimate_coherence(text: &str, last_tokens: &mut Vec<String>) -> f64 {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return 0.0;
    }

    let closure = if trimmed.ends_with(['.', '!', '?']) { 1.0 } else { 0.5 };
    let length_factor = clamp01((text.chars().count() as f64 - 80.0) / 400.0);

    let lower = text.to_lowercase();
    let tokens: HashSet<&str> = lower.split_whitespace().collect();
    let overlap = last_tokens.iter().filter(|t| tokens.contains(t.as_str())).count();

    let mut next: Vec<String> = tokens.iter().map(|t| t.to_string()).collect();
    next.sort();
    *last_tokens = next;

    let soft_penalty = clamp01(overlap as f64 / 20.0) * 0.15;
    let hard_penalty = if has_word_run(&lower) { 0.2 } else { 0.0 };

    clamp01(0.6 * closure + 0.4 * length_factor - (soft_penalty + hard_penalty))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn word_runs() {
        assert!(has_word_run("the loop loop loop continues"));
        assert!(has_word_run("Again again AGAIN"));
        assert!(!has_word_run("loop loop, loop"));
        assert!(!has_word_run("loop loop"));
        assert!(!has_word_run("loops loop loop"));
    }

    #[test]
    fn recursion_scores() {
        assert_eq!(estimate_recursion("a fresh idea"), 0.0);
        assert!((estimate_recursion("as I said, again") - 0.2).abs() < 1e-9);
        assert!((estimate_recursion("again again again") - 0.9).abs() < 1e-9);
        assert_eq!(estimate_recursion("repeat repeat repeat again again"), 1.0);
    }

    #[test]
    fn coherence_blank_keeps_previous_tokens() {
        let mut last = vec!["kept".to_string()];
        assert_eq!(estimate_coherence("   ", &mut last), 0.0);
        assert_eq!(last, vec!["kept"]);
    }

    #[test]
    fn coherence_closure_and_overlap() {
        let mut last = Vec::new();
        assert!((estimate_coherence("Short and closed.", &mut last) - 0.6).abs() < 1e-9);
        assert!((estimate_coherence("no closure here", &mut last) - 0.3).abs() < 1e-9);

        // 20 shared tokens saturate the soft penalty
        let text: String = (0..20).map(|i| format!("w{i} ")).collect();
        let mut last = Vec::new();
        estimate_coherence(&text, &mut last);
        let k = estimate_coherence(&text, &mut last);
        assert!((k - (0.3 - 0.15)).abs() < 1e-9);
    }

    #[test]
    fn coherence_length_bonus() {
        let long = format!("{}.", "x".repeat(479));
        let mut last = Vec::new();
        assert!((estimate_coherence(&long, &mut last) - 1.0).abs() < 1e-9);
    }
}
