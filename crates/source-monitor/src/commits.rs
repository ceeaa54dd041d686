//! Enumerate non-merge commits within the cloned window (§4.3 step 2).

use std::path::Path;
use std::time::Duration;

use cdc_core::process::run_with_timeout;

use crate::error::Result;

const LOG_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct CommitInfo {
    pub short_hash: String,
    pub subject: String,
    pub author: String,
    pub datetime: String,
}

pub fn list_commits(repo_dir: &Path) -> Result<Vec<CommitInfo>> {
    let output = run_with_timeout(
        "git",
        &[
            "log",
            "--no-merges",
            "--pretty=format:%h\x1f%s\x1f%an\x1f%ad",
            "--date=iso",
        ],
        Some(repo_dir),
        LOG_TIMEOUT,
    )?;
    if !output.success() {
        return Ok(Vec::new());
    }
    Ok(output
        .stdout
        .lines()
        .filter(|l| !l.is_empty())
        .filter_map(|line| {
            let mut parts = line.splitn(4, '\x1f');
            Some(CommitInfo {
                short_hash: parts.next()?.to_string(),
                subject: parts.next()?.to_string(),
                author: parts.next()?.to_string(),
                datetime: parts.next()?.to_string(),
            })
        })
        .collect())
}
