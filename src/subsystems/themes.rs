//! Stats and theme extraction over recorded node texts.
//!
//! Word tallies keep first-appearance order for ties, so reports are
//! deterministic for a given store.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::LazyLock;

use chrono::{DateTime, Duration, Utc};
use regex::Regex;

use crate::core::time::parse_iso;
use crate::subsystems::store::Node;

static WORD_RE: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"[a-z0-9']+").ok());

pub const STOP_BASE: &[&str] = &[
    "a", "an", "the", "and", "or", "but", "if", "then", "so", "to", "of", "in", "on", "for",
    "with", "is", "are", "was", "were", "be", "been", "being", "this", "that", "these", "those",
    "it", "its", "i", "you", "we", "they", "he", "she", "them", "us", "my", "your", "our",
    "their", "as", "at", "by",
];

// ── Tally ────────────────────────────────────────────────────────────────────

/// Insertion-ordered counter.
#[derive(Debug, Default)]
pub struct Tally {
    index: HashMap<String, usize>,
    entries: Vec<(String, usize)>,
}

impl Tally {
    pub fn add(&mut self, key: &str) {
        match self.index.get(key) {
            Some(&i) => self.entries[i].1 += 1,
            None => {
                self.index.insert(key.to_string(), self.entries.len());
                self.entries.push((key.to_string(), 1));
            }
        }
    }

    pub fn extend<'a>(&mut self, keys: impl IntoIterator<Item = &'a str>) {
        for k in keys {
            self.add(k);
        }
    }

    /// Highest counts first; equal counts keep first-seen order.
    pub fn most_common(&self, n: usize) -> Vec<(String, usize)> {
        let mut sorted = self.entries.clone();
        sorted.sort_by(|a, b| b.1.cmp(&a.1));
        sorted.truncate(n);
        sorted
    }
}

// ── Tokens ───────────────────────────────────────────────────────────────────

/// Every `[a-z0-9']+` run in the lowercased text.
pub fn raw_words(text: &str) -> Vec<String> {
    let Some(re) = WORD_RE.as_ref() else {
        return Vec::new();
    };
    let lower = text.to_lowercase();
    re.find_iter(&lower).map(|m| m.as_str().to_string()).collect()
}

/// Content words: raw words minus short tokens, stop words, numbers and
/// alphabet-run junk such as `abcdefghij`.
pub fn tokenize(text: &str, extra_stop: &HashSet<String>, min_len: usize) -> Vec<String> {
    raw_words(text)
        .into_iter()
        .filter(|w| {
            let len = w.chars().count();
            len >= min_len
                && !STOP_BASE.contains(&w.as_str())
                && !extra_stop.contains(w)
                && !w.chars().all(|c| c.is_ascii_digit())
                && !is_alphabet_run(w, len)
        })
        .collect()
}

fn is_alphabet_run(word: &str, len: usize) -> bool {
    if len < 10 || !word.chars().all(char::is_alphabetic) {
        return false;
    }
    let unique: HashSet<char> = word.chars().collect();
    unique.len() as f64 / len as f64 > 0.8
}

/// Adjacent word pairs, skipping pairs of the same word.
pub fn bigrams(words: &[String]) -> Vec<String> {
    words
        .windows(2)
        .filter(|w| w[0] != w[1])
        .map(|w| format!("{} {}", w[0], w[1]))
        .collect()
}

fn first_occurrences(items: &[String]) -> Vec<&str> {
    let mut seen = HashSet::new();
    items.iter().map(String::as_str).filter(|s| seen.insert(*s)).collect()
}

/// Top `n` words and phrases across `texts`. With `presence`, a token counts
/// at most once per text.
pub fn top_themes(
    texts: &[String],
    n: usize,
    extra_stop: &HashSet<String>,
    min_len: usize,
    presence: bool,
) -> (Vec<(String, usize)>, Vec<(String, usize)>) {
    let mut uni = Tally::default();
    let mut bi = Tally::default();
    for text in texts {
        let words = tokenize(text, extra_stop, min_len);
        let pairs = bigrams(&words);
        if presence {
            uni.extend(first_occurrences(&words));
            bi.extend(first_occurrences(&pairs));
        } else {
            uni.extend(words.iter().map(String::as_str));
            bi.extend(pairs.iter().map(String::as_str));
        }
    }
    (uni.most_common(n), bi.most_common(n))
}

// ── Stats report ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct StatsOptions {
    pub top: usize,
    /// Most common raw tokens hidden from the filtered view.
    pub hide_top: usize,
    pub min_len: usize,
    /// Per-node presence (`true`) vs raw frequency.
    pub presence: bool,
    /// Activity window in UTC days; 0 disables it.
    pub days: u32,
}

impl Default for StatsOptions {
    fn default() -> Self {
        Self { top: 8, hide_top: 5, min_len: 3, presence: true, days: 14 }
    }
}

#[derive(Debug, Clone, Default)]
pub struct StatsReport {
    pub total: usize,
    pub days: u32,
    /// `(YYYY-MM-DD, count)` ascending by date.
    pub activity: Vec<(String, usize)>,
    pub top_raw: Vec<(String, usize)>,
    pub top_words: Vec<(String, usize)>,
    pub top_phrases: Vec<(String, usize)>,
}

pub fn stats(nodes: &[Node], opts: &StatsOptions) -> StatsReport {
    stats_at(nodes, opts, Utc::now())
}

pub fn stats_at(nodes: &[Node], opts: &StatsOptions, now: DateTime<Utc>) -> StatsReport {
    let texts: Vec<String> = nodes
        .iter()
        .map(Node::resolved_text)
        .filter(|t| !t.trim().is_empty())
        .collect();

    let mut report = StatsReport { total: nodes.len(), days: opts.days, ..Default::default() };
    if texts.is_empty() {
        return report;
    }

    if opts.days > 0 {
        let cutoff = now - Duration::days(i64::from(opts.days) - 1);
        let mut buckets: BTreeMap<String, usize> = BTreeMap::new();
        for dt in nodes.iter().filter_map(|n| parse_iso(n.ts())) {
            if dt >= cutoff {
                *buckets.entry(dt.date_naive().to_string()).or_default() += 1;
            }
        }
        report.activity = buckets.into_iter().collect();
    }

    let mut raw = Tally::default();
    for t in &texts {
        for w in raw_words(t) {
            raw.add(&w);
        }
    }
    report.top_raw = raw.most_common(opts.top);

    let dynamic_stop: HashSet<String> = if opts.hide_top > 0 {
        raw.most_common(opts.hide_top).into_iter().map(|(w, _)| w).collect()
    } else {
        HashSet::new()
    };

    let candidates = 100.max(opts.top * 20);
    let (mut words, mut phrases) =
        top_themes(&texts, candidates, &dynamic_stop, opts.min_len, opts.presence);
    words.truncate(opts.top);
    phrases.truncate(opts.top);
    report.top_words = words;
    report.top_phrases = phrases;
    report
}

/// One-line read on where recorded attention is converging.
pub fn insight(texts: &[String]) -> String {
    if texts.is_empty() {
        return "no signal yet".into();
    }
    let mut counts = Tally::default();
    for t in texts {
        let lower = t.to_lowercase();
        counts.extend(lower.split_whitespace());
    }
    match counts.most_common(1).into_iter().next() {
        None => "signals are still forming".into(),
        Some((word, n)) if n > 5 => format!("focus is consolidating around '{word}'"),
        Some((word, n)) if n > 2 => format!("'{word}' is emerging as a theme"),
        Some(_) => "exploration phase — no dominant signal yet".into(),
    }
}
