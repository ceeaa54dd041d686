//! Enumerate changed files in the watched window and intersect with the
//! configured watched-paths list (§4.3 step 3).

use std::collections::BTreeSet;
use std::path::Path;
use std::time::Duration;

use cdc_core::process::run_with_timeout;

use crate::error::Result;

const LOG_TIMEOUT: Duration = Duration::from_secs(30);

pub fn changed_files(repo_dir: &Path) -> Result<Vec<String>> {
    let output = run_with_timeout(
        "git",
        &["log", "--no-merges", "--name-only", "--pretty=format:"],
        Some(repo_dir),
        LOG_TIMEOUT,
    )?;
    if !output.success() {
        return Ok(Vec::new());
    }
    let set: BTreeSet<String> = output
        .stdout
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect();
    Ok(set.into_iter().collect())
}

/// A changed file is a watched hit if it equals a watched path or is nested
/// under one. An empty watch list hits nothing (§6.1: `watched_paths` opts
/// files into `ADDITIVE` classification, it does not default to "all").
pub fn watched_hits(changed: &[String], watched_paths: &[String]) -> Vec<String> {
    if watched_paths.is_empty() {
        return Vec::new();
    }
    changed
        .iter()
        .filter(|file| {
            watched_paths
                .iter()
                .any(|w| *file == w || file.starts_with(&format!("{w}/")))
        })
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn watched_hits_matches_exact_and_nested_paths() {
        let changed = vec!["src/lib.rs".to_string(), "docs/readme.md".to_string()];
        let watched = vec!["src".to_string()];
        let hits = watched_hits(&changed, &watched);
        assert_eq!(hits, vec!["src/lib.rs".to_string()]);
    }

    #[test]
    fn empty_watch_list_yields_no_hits() {
        let changed = vec!["src/lib.rs".to_string()];
        assert!(watched_hits(&changed, &[]).is_empty());
    }
}
