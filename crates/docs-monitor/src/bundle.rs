//! Bundle format (§6.3): pages separated by lines matching a
//! source-configured delimiter, with the URL carried on the delimiter line
//! itself. The segment before the first delimiter line is ignored.

use regex::Regex;
use sha2::{Digest, Sha256};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    pub url: String,
    pub content: String,
}

/// Split `bundle` into pages using `delimiter`, which may be a literal
/// prefix (the common case, e.g. `"Source: "`) or a regex with a capturing
/// group around the URL (§6.3, §9 "page delimiter ambiguity": always
/// source-configured, never a global constant).
pub fn split_pages(bundle: &str, delimiter: &str) -> Vec<Page> {
    if let Ok(re) = Regex::new(delimiter) {
        if re.captures_len() > 1 {
            return split_by_regex(bundle, &re);
        }
    }
    split_by_literal_prefix(bundle, delimiter)
}

fn split_by_literal_prefix(bundle: &str, delimiter: &str) -> Vec<Page> {
    let mut pages = Vec::new();
    let mut current: Option<(String, Vec<&str>)> = None;

    for line in bundle.lines() {
        if let Some(rest) = line.strip_prefix(delimiter) {
            if let Some((url, lines)) = current.take() {
                pages.push(Page {
                    url,
                    content: lines.join("\n"),
                });
            }
            current = Some((rest.trim().to_string(), Vec::new()));
        } else if let Some((_, lines)) = current.as_mut() {
            lines.push(line);
        }
        // Lines before the first delimiter are ignored.
    }
    if let Some((url, lines)) = current {
        pages.push(Page {
            url,
            content: lines.join("\n"),
        });
    }
    pages
}

fn split_by_regex(bundle: &str, re: &Regex) -> Vec<Page> {
    let mut pages = Vec::new();
    let mut current: Option<(String, Vec<&str>)> = None;

    for line in bundle.lines() {
        if let Some(caps) = re.captures(line) {
            if let Some(url) = caps.get(1) {
                if let Some((url, lines)) = current.take() {
                    pages.push(Page {
                        url,
                        content: lines.join("\n"),
                    });
                }
                current = Some((url.as_str().trim().to_string(), Vec::new()));
                continue;
            }
        }
        if let Some((_, lines)) = current.as_mut() {
            lines.push(line);
        }
    }
    if let Some((url, lines)) = current {
        pages.push(Page {
            url,
            content: lines.join("\n"),
        });
    }
    pages
}

/// Normalize: strip trailing whitespace per line, collapse blank runs
/// (§4.2 Layer 2 step 1).
pub fn normalize(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut blank_run = false;
    for line in text.lines() {
        let trimmed = line.trim_end();
        if trimmed.is_empty() {
            if blank_run {
                continue;
            }
            blank_run = true;
        } else {
            blank_run = false;
        }
        out.push_str(trimmed);
        out.push('\n');
    }
    out
}

pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_two_pages_on_literal_delimiter() {
        let bundle = "ignored preamble\nSource: https://x/p1\nhello\nSource: https://x/p2\nworld\n";
        let pages = split_pages(bundle, "Source: ");
        assert_eq!(pages.len(), 2);
        assert_eq!(pages[0].url, "https://x/p1");
        assert_eq!(pages[0].content.trim(), "hello");
        assert_eq!(pages[1].url, "https://x/p2");
        assert_eq!(pages[1].content.trim(), "world");
    }

    #[test]
    fn zero_pages_for_empty_bundle() {
        assert!(split_pages("", "Source: ").is_empty());
    }

    #[test]
    fn preamble_before_first_delimiter_is_ignored() {
        let bundle = "not a page\nSource: https://x/p1\nbody\n";
        let pages = split_pages(bundle, "Source: ");
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].content.trim(), "body");
    }

    #[test]
    fn normalize_collapses_blank_runs_and_trailing_whitespace() {
        let input = "line one   \n\n\n\nline two\t\n";
        let normalized = normalize(input);
        assert_eq!(normalized, "line one\n\nline two\n");
    }

    #[test]
    fn sha256_is_deterministic() {
        assert_eq!(sha256_hex(b"hello"), sha256_hex(b"hello"));
        assert_ne!(sha256_hex(b"hello"), sha256_hex(b"world"));
    }
}
