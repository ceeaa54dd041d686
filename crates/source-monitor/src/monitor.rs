//! Orchestrates the git-source check (§4.3): shallow clone, commit and
//! changed-file enumeration, public-API extraction, deprecation scan,
//! source-level classification, and summary persistence as a session event.

use serde_json::json;

use cdc_core::config::{Source, SourceKind};
use cdc_core::extractor::PublicApiExtractor;
use cdc_core::obs;
use cdc_store::Store;

use crate::clone::shallow_clone;
use crate::commits::list_commits;
use crate::deprecation::{self, DeprecationHit};
use crate::error::Result;
use crate::extract::RustExtractor;
use crate::files::{changed_files, watched_hits};

const TOP_N_COMMITS: usize = 10;

/// Source-level classification (§4.3 step 6). Distinct from the Docs
/// Monitor's page-level `Classification`: a git source that produced no
/// commits at all in the window has no opinion, which the page classifier
/// never needs to express.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceClassification {
    Breaking,
    Additive,
    Cosmetic,
    None,
}

impl SourceClassification {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceClassification::Breaking => "BREAKING",
            SourceClassification::Additive => "ADDITIVE",
            SourceClassification::Cosmetic => "COSMETIC",
            SourceClassification::None => "NONE",
        }
    }
}

pub struct GitCheckReport {
    pub source: String,
    pub classification: SourceClassification,
    pub commit_count: usize,
    pub changed_file_count: usize,
    pub watched_hits: Vec<String>,
    pub deprecations: Vec<DeprecationHit>,
}

/// Run the full check for one `git` source. A `docs` source is a no-op
/// here; it belongs to the docs monitor.
pub fn check_git_source(store: &Store, source: &Source) -> Result<GitCheckReport> {
    let (repo_url, watched_paths) = match &source.kind {
        SourceKind::Git {
            repo_url,
            watched_paths,
        } => (repo_url.clone(), watched_paths.clone()),
        SourceKind::Docs { .. } => {
            return Ok(empty_report(source, SourceClassification::None));
        }
    };

    let cloned = match shallow_clone(&repo_url) {
        Ok(repo) => repo,
        Err(e) => {
            let message = e.to_string();
            obs::emit_clone_failed(&source.name, &message);
            store.record_session_event(
                &source.name,
                "clone_failed",
                &source.name,
                json!({ "error": message }),
            )?;
            return Ok(empty_report(source, SourceClassification::None));
        }
    };

    let commits = list_commits(cloned.path())?;
    let changed = changed_files(cloned.path())?;
    let hits = watched_hits(&changed, &watched_paths);
    let deprecations = deprecation::scan(&commits);

    let extractor = RustExtractor;
    let mut signature_count = 0usize;
    for file in &changed {
        let path = cloned.path().join(file);
        if !extractor.supports(&path) || !path.is_file() {
            continue;
        }
        match extractor.extract(&path) {
            Ok(sigs) => signature_count += sigs.len(),
            Err(e) => tracing::warn!(event = "ast_parse_failed", file, error = %e, "skipped file"),
        }
    }

    let classification = if !deprecations.is_empty() {
        SourceClassification::Breaking
    } else if !hits.is_empty() {
        SourceClassification::Additive
    } else if !commits.is_empty() {
        SourceClassification::Cosmetic
    } else {
        SourceClassification::None
    };

    let top_commits: Vec<String> = commits
        .iter()
        .take(TOP_N_COMMITS)
        .map(|c| format!("{} {}", c.short_hash, c.subject))
        .collect();
    let deprecation_entries: Vec<String> = deprecations
        .iter()
        .map(|d| format!("{}: {} ({})", d.short_hash, d.subject, d.keyword))
        .collect();

    store.record_session_event(
        &source.name,
        "source_check_summary",
        &source.name,
        json!({
            "commits_count": commits.len(),
            "changed_files_count": changed.len(),
            "watched_hits": hits.len(),
            "deprecations": deprecation_entries,
            "top_commits": top_commits,
            "public_symbols_seen": signature_count,
            "classification": classification.as_str(),
        }),
    )?;

    Ok(GitCheckReport {
        source: source.name.clone(),
        classification,
        commit_count: commits.len(),
        changed_file_count: changed.len(),
        watched_hits: hits,
        deprecations,
    })
}

fn empty_report(source: &Source, classification: SourceClassification) -> GitCheckReport {
    GitCheckReport {
        source: source.name.clone(),
        classification,
        commit_count: 0,
        changed_file_count: 0,
        watched_hits: Vec::new(),
        deprecations: Vec::new(),
    }
}
