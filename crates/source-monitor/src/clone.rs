//! Shallow-clone of an upstream repository into a temporary directory
//! (§4.3 step 1), limited to a rolling commit window and bounded by a 120s
//! timeout. Generalizes the teacher's `aivcs-core::git` subprocess pattern
//! to the blocking watchdog-timeout shape (SPEC_FULL.md §1).

use std::time::Duration;

use chrono::{Duration as ChronoDuration, Utc};

use cdc_core::process::run_with_timeout;

use crate::error::{Result, SourceMonitorError};

const CLONE_TIMEOUT: Duration = Duration::from_secs(120);
pub const COMMIT_WINDOW_DAYS: i64 = 30;

pub struct ClonedRepo {
    dir: tempfile::TempDir,
}

impl ClonedRepo {
    pub fn path(&self) -> &std::path::Path {
        self.dir.path()
    }
}

/// Shallow-clone `repo_url`, limited to commits within `COMMIT_WINDOW_DAYS`
/// of now. The clone directory is removed automatically when the returned
/// `ClonedRepo` drops (§4.3 step 7, "remove the temporary clone directory").
pub fn shallow_clone(repo_url: &str) -> Result<ClonedRepo> {
    let dir = tempfile::tempdir().map_err(|e| SourceMonitorError::CloneFailed {
        repo_url: repo_url.to_string(),
        message: e.to_string(),
    })?;
    let since = (Utc::now() - ChronoDuration::days(COMMIT_WINDOW_DAYS))
        .format("%Y-%m-%d")
        .to_string();
    let dest = dir.path().display().to_string();

    let output = run_with_timeout(
        "git",
        &["clone", "--quiet", "--shallow-since", &since, repo_url, &dest],
        None,
        CLONE_TIMEOUT,
    )?;

    if !output.success() {
        return Err(SourceMonitorError::CloneFailed {
            repo_url: repo_url.to_string(),
            message: output.stderr,
        });
    }

    Ok(ClonedRepo { dir })
}
