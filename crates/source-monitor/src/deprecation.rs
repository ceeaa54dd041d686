//! Scan commit subjects for deprecation keywords (§4.3 step 5): the
//! breaking-phrase vocabulary from `cdc_core::classify`, extended with a
//! few commit-message-specific terms.

use cdc_core::classify::{matching_phrase, DEPRECATION_KEYWORDS};

use crate::commits::CommitInfo;

#[derive(Debug, Clone)]
pub struct DeprecationHit {
    pub short_hash: String,
    pub subject: String,
    pub keyword: &'static str,
}

pub fn scan(commits: &[CommitInfo]) -> Vec<DeprecationHit> {
    commits
        .iter()
        .filter_map(|c| {
            matching_phrase(&c.subject, DEPRECATION_KEYWORDS).map(|keyword| DeprecationHit {
                short_hash: c.short_hash.clone(),
                subject: c.subject.clone(),
                keyword,
            })
        })
        .collect()
}
