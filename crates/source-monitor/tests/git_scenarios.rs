use std::path::Path;
use std::process::Command;

use cdc_core::config::{Source, SourceKind};
use cdc_store::Store;
use source_monitor::{check_git_source, SourceClassification};

fn run_git(dir: &Path, args: &[&str]) {
    let status = Command::new("git").args(args).current_dir(dir).status().unwrap();
    assert!(status.success(), "git {args:?} failed");
}

fn make_upstream_repo() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    run_git(dir.path(), &["init", "--quiet"]);
    run_git(dir.path(), &["config", "user.name", "test"]);
    run_git(dir.path(), &["config", "user.email", "test@example.com"]);
    std::fs::write(dir.path().join("lib.rs"), "pub fn do_thing() {}\n").unwrap();
    run_git(dir.path(), &["add", "."]);
    run_git(dir.path(), &["commit", "-m", "initial commit"]);
    dir
}

fn git_source(repo_dir: &Path, watched_paths: Vec<String>) -> Source {
    Source {
        name: "upstream".to_string(),
        kind: SourceKind::Git {
            repo_url: format!("file://{}", repo_dir.display()),
            watched_paths,
        },
    }
}

#[test]
fn scenario_f_deprecation_commit_yields_breaking_classification() {
    let upstream = make_upstream_repo();
    run_git(
        upstream.path(),
        &["commit", "--allow-empty", "-m", "Remove deprecated Foo.bar() method"],
    );

    let store = Store::open_in_memory().unwrap();
    let source = git_source(upstream.path(), Vec::new());
    let config = cdc_core::config::Config {
        sources: vec![source.clone()],
        skills: Vec::new(),
        budget_thresholds: Default::default(),
        freshness_threshold: std::time::Duration::from_secs(604_800),
    };
    store.sync_config(&config).unwrap();

    let report = check_git_source(&store, &source).unwrap();
    assert_eq!(report.classification, SourceClassification::Breaking);
    assert_eq!(report.deprecations.len(), 1);
    assert_eq!(report.deprecations[0].keyword, "deprecated");

    let latest = store.latest_source_check("upstream").unwrap();
    assert!(latest.is_some());
}

#[test]
fn ordinary_commit_touching_watched_path_is_additive() {
    let upstream = make_upstream_repo();
    std::fs::write(upstream.path().join("lib.rs"), "pub fn do_thing() {}\npub fn do_more() {}\n").unwrap();
    run_git(upstream.path(), &["add", "."]);
    run_git(upstream.path(), &["commit", "-m", "extend the public surface"]);

    let store = Store::open_in_memory().unwrap();
    let source = git_source(upstream.path(), vec!["lib.rs".to_string()]);
    let config = cdc_core::config::Config {
        sources: vec![source.clone()],
        skills: Vec::new(),
        budget_thresholds: Default::default(),
        freshness_threshold: std::time::Duration::from_secs(604_800),
    };
    store.sync_config(&config).unwrap();

    let report = check_git_source(&store, &source).unwrap();
    assert_eq!(report.classification, SourceClassification::Additive);
    assert!(!report.watched_hits.is_empty());
}

#[test]
fn clone_failure_records_clone_failed_event_and_none_classification() {
    let store = Store::open_in_memory().unwrap();
    let source = Source {
        name: "ghost".to_string(),
        kind: SourceKind::Git {
            repo_url: "file:///nonexistent/path/to/repo".to_string(),
            watched_paths: Vec::new(),
        },
    };
    let config = cdc_core::config::Config {
        sources: vec![source.clone()],
        skills: Vec::new(),
        budget_thresholds: Default::default(),
        freshness_threshold: std::time::Duration::from_secs(604_800),
    };
    store.sync_config(&config).unwrap();

    let report = check_git_source(&store, &source).unwrap();
    assert_eq!(report.classification, SourceClassification::None);
}
