//! Lexical change classification, shared between the Docs Monitor's
//! CLASSIFY layer (§4.2 Layer 3) and the Source Monitor's deprecation scan
//! (§4.3 step 5), which uses a superset of the same phrase vocabulary.

use std::collections::HashSet;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

pub const BREAKING_PHRASES: &[&str] = &[
    "removed",
    "deprecated",
    "no longer",
    "must now",
    "replaced by",
    "breaking change",
    "incompatible",
];

pub const ADDITIVE_PHRASES: &[&str] = &["new", "added", "now supports", "introduces", "you can now"];

/// Superset used by the Source Monitor's commit-subject scan (§4.3 step 5).
pub const DEPRECATION_KEYWORDS: &[&str] = &[
    "removed",
    "deprecated",
    "no longer",
    "must now",
    "replaced by",
    "breaking change",
    "incompatible",
    "rename",
    "replace",
    "migrate",
    "backward compat",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Classification {
    Breaking,
    Additive,
    Cosmetic,
}

impl Classification {
    pub fn as_str(&self) -> &'static str {
        match self {
            Classification::Breaking => "BREAKING",
            Classification::Additive => "ADDITIVE",
            Classification::Cosmetic => "COSMETIC",
        }
    }
}

impl std::fmt::Display for Classification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Deterministic classifier for a detected `(old_content, new_content)` pair
/// (§4.2 Layer 3, invariant in §3.2 and §8.1 property 2). Given empty
/// `old_content` this always returns `Additive` (initial capture); otherwise
/// it scans the line-level diff for breaking, then additive, vocabulary.
pub fn classify_diff(old_content: &str, new_content: &str) -> Classification {
    if old_content.is_empty() {
        return Classification::Additive;
    }
    let diff = line_diff_text(old_content, new_content);
    if contains_any_phrase(&diff, BREAKING_PHRASES) {
        return Classification::Breaking;
    }
    if contains_any_phrase(&diff, ADDITIVE_PHRASES) {
        return Classification::Additive;
    }
    Classification::Cosmetic
}

/// Lines present in one side but not the other, concatenated for phrase
/// scanning. This is a lexical heuristic, not a true sequence diff: the
/// classifier only cares whether vocabulary appears in the delta, not about
/// line positions.
fn line_diff_text(old: &str, new: &str) -> String {
    let old_lines: HashSet<&str> = old.lines().collect();
    let new_lines: HashSet<&str> = new.lines().collect();
    let mut out = String::new();
    for line in new.lines() {
        if !old_lines.contains(line) {
            out.push_str(line);
            out.push('\n');
        }
    }
    for line in old.lines() {
        if !new_lines.contains(line) {
            out.push_str(line);
            out.push('\n');
        }
    }
    out
}

pub fn contains_any_phrase(text: &str, phrases: &[&str]) -> bool {
    phrases.iter().any(|p| phrase_regex(p).is_match(text))
}

/// Find the matching keyword, if any, for the deprecation-commit scan
/// (§4.3 step 5 needs the matched keyword, not just a boolean).
pub fn matching_phrase<'a>(text: &str, phrases: &[&'a str]) -> Option<&'a str> {
    phrases.iter().find(|p| phrase_regex(p).is_match(text)).copied()
}

fn phrase_regex(phrase: &str) -> Regex {
    static CACHE: OnceLock<std::sync::Mutex<std::collections::HashMap<String, Regex>>> = OnceLock::new();
    let cache = CACHE.get_or_init(|| std::sync::Mutex::new(std::collections::HashMap::new()));
    let mut guard = cache.lock().unwrap();
    guard
        .entry(phrase.to_string())
        .or_insert_with(|| {
            let escaped = regex::escape(phrase).replace(' ', r"\s+");
            Regex::new(&format!(r"(?i)\b{escaped}\b")).expect("static phrase pattern")
        })
        .clone()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_old_content_is_additive() {
        assert_eq!(classify_diff("", "hello"), Classification::Additive);
    }

    #[test]
    fn breaking_phrase_wins() {
        let c = classify_diff("the foo parameter exists", "the foo parameter is removed");
        assert_eq!(c, Classification::Breaking);
    }

    #[test]
    fn additive_phrase_when_no_breaking() {
        let c = classify_diff("supports x", "now supports y");
        assert_eq!(c, Classification::Additive);
    }

    #[test]
    fn whitespace_only_change_is_cosmetic() {
        let c = classify_diff("hello world", "hello world ");
        assert_eq!(c, Classification::Cosmetic);
    }

    #[test]
    fn whole_word_matching_does_not_false_positive() {
        // "renewed" contains "new" as a substring but not as a whole word.
        let c = classify_diff("old text here", "renewed text here");
        assert_eq!(c, Classification::Cosmetic);
    }

    #[test]
    fn matching_phrase_returns_matched_keyword() {
        let m = matching_phrase("Remove deprecated Foo.bar() method", DEPRECATION_KEYWORDS);
        assert_eq!(m, Some("deprecated"));
    }
}
