//! Dispatches a single source to the Docs Monitor or Source Monitor
//! depending on its configured kind, normalizing both into one
//! printable outcome for the `check` command.

use cdc_core::config::{Source, SourceKind};
use cdc_store::Store;

#[derive(Debug)]
pub enum CheckOutcome {
    Docs {
        source_name: String,
        result: Result<docs_monitor::SourceCheckReport, docs_monitor::DocsMonitorError>,
    },
    Git {
        source_name: String,
        result: Result<source_monitor::GitCheckReport, source_monitor::SourceMonitorError>,
    },
}

impl CheckOutcome {
    pub fn source_name(&self) -> &str {
        match self {
            CheckOutcome::Docs { source_name, .. } => source_name,
            CheckOutcome::Git { source_name, .. } => source_name,
        }
    }

    pub fn is_err(&self) -> bool {
        match self {
            CheckOutcome::Docs { result, .. } => result.is_err(),
            CheckOutcome::Git { result, .. } => result.is_err(),
        }
    }

    pub fn render(&self) -> String {
        match self {
            CheckOutcome::Docs { source_name, result } => match result {
                Ok(report) => format!(
                    "{source_name}: watermark_changed={} changes={}",
                    report.watermark_changed,
                    report.changes.len()
                ),
                Err(e) => format!("{source_name}: ERROR {e}"),
            },
            CheckOutcome::Git { source_name, result } => match result {
                Ok(report) => format!(
                    "{source_name}: classification={} commits={} changed_files={}",
                    report.classification.as_str(),
                    report.commit_count,
                    report.changed_file_count
                ),
                Err(e) => format!("{source_name}: ERROR {e}"),
            },
        }
    }
}

pub fn check_one(store: &Store, source: &Source) -> CheckOutcome {
    match &source.kind {
        SourceKind::Docs { .. } => CheckOutcome::Docs {
            source_name: source.name.clone(),
            result: docs_monitor::check_docs_source(store, source),
        },
        SourceKind::Git { .. } => CheckOutcome::Git {
            source_name: source.name.clone(),
            result: source_monitor::check_git_source(store, source),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cdc_core::config::{Config, Skill};
    use std::time::Duration;

    #[test]
    fn docs_source_dispatches_to_docs_monitor() {
        let store = Store::open_in_memory().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let bundle_path = dir.path().join("bundle.txt");
        std::fs::write(&bundle_path, "hello world\n").unwrap();

        let source = Source {
            name: "docs".to_string(),
            kind: SourceKind::Docs {
                bundle_url: bundle_path.display().to_string(),
                pages: vec![],
                page_delimiter: "Source: ".to_string(),
            },
        };
        let config = Config {
            sources: vec![source.clone()],
            skills: Vec::<Skill>::new(),
            budget_thresholds: Default::default(),
            freshness_threshold: Duration::from_secs(604_800),
        };
        store.sync_config(&config).unwrap();

        let outcome = check_one(&store, &source);
        assert!(matches!(outcome, CheckOutcome::Docs { .. }));
        assert!(!outcome.is_err());
        assert_eq!(outcome.source_name(), "docs");
    }
}
