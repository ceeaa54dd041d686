//! Read-side view row shapes (§4.1 "Views"). Views are never materialized
//! tables; they are always derived fresh from fact rows by the queries in
//! `store.rs`.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

#[derive(Debug, Clone, PartialEq)]
pub struct SkillFreshness {
    pub skill_name: String,
    pub last_checked: Option<DateTime<Utc>>,
    pub last_validated_at: Option<DateTime<Utc>>,
    pub breaking_since_validation: u64,
    pub additive_since_validation: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FileTypeBudget {
    pub line_count: u64,
    pub estimated_tokens: u64,
    pub threshold: Option<u64>,
    pub over_budget: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SkillBudget {
    pub skill_name: String,
    pub by_filetype: HashMap<String, FileTypeBudget>,
    pub over_budget: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SourceCheckSummary {
    pub source_name: String,
    pub checked_at: DateTime<Utc>,
    pub commits_count: u64,
    pub changed_files_count: u64,
    pub watched_hits: u64,
    pub deprecations: Vec<String>,
    pub top_commits: Vec<String>,
    pub classification: String,
}
