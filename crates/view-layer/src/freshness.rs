//! Freshness query (§4.4): must never block and must always return success,
//! even when the store is empty or a query fails, because its intended use
//! is inline in a user-facing prompt where a hard failure is unacceptable.

use std::time::Duration;

use chrono::{DateTime, Utc};

use cdc_core::config::Skill;
use cdc_store::Store;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceStatus {
    pub source_name: String,
    pub last_checked: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FreshnessReport {
    pub skill_name: String,
    pub is_stale: bool,
    pub last_checked: Option<DateTime<Utc>>,
    pub staleness: Option<Duration>,
    pub per_source_status: Vec<SourceStatus>,
    pub message: String,
}

/// Never returns an error. On any internal failure this degrades to a
/// well-formed "unknown freshness" record rather than propagating.
pub fn freshness(store: &Store, skill: &Skill, threshold: Duration) -> FreshnessReport {
    match freshness_inner(store, skill, threshold) {
        Ok(report) => report,
        Err(e) => {
            tracing::warn!(
                event = "freshness_query_failed",
                skill = %skill.name,
                error = %e,
                "degrading to unknown freshness"
            );
            FreshnessReport {
                skill_name: skill.name.clone(),
                is_stale: true,
                last_checked: None,
                staleness: None,
                per_source_status: Vec::new(),
                message: "freshness unknown: query failed".to_string(),
            }
        }
    }
}

fn freshness_inner(
    store: &Store,
    skill: &Skill,
    threshold: Duration,
) -> cdc_store::Result<FreshnessReport> {
    let aggregate = store.skill_freshness(&skill.name)?;

    let mut per_source_status = Vec::with_capacity(skill.sources.len());
    for source_name in &skill.sources {
        let watermark_ts = store.latest_watermark(source_name)?.map(|row| row.checked_at);
        let source_check_ts = store.latest_source_check(source_name)?.map(|row| row.checked_at);
        let last_checked = match (watermark_ts, source_check_ts) {
            (Some(a), Some(b)) => Some(a.max(b)),
            (Some(a), None) => Some(a),
            (None, Some(b)) => Some(b),
            (None, None) => None,
        };
        per_source_status.push(SourceStatus {
            source_name: source_name.clone(),
            last_checked,
        });
    }

    let staleness = aggregate
        .last_checked
        .map(|ts| (Utc::now() - ts).to_std().unwrap_or_default());
    let is_stale = if skill.sources.is_empty() {
        false
    } else {
        match staleness {
            Some(age) => age > threshold,
            None => true,
        }
    };
    let message = if skill.sources.is_empty() {
        "no dependent sources".to_string()
    } else if aggregate.last_checked.is_none() {
        "never checked".to_string()
    } else if is_stale {
        "stale: last check exceeds the freshness threshold".to_string()
    } else {
        "fresh".to_string()
    };

    Ok(FreshnessReport {
        skill_name: skill.name.clone(),
        is_stale,
        last_checked: aggregate.last_checked,
        staleness,
        per_source_status,
        message,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn skill(sources: Vec<String>) -> Skill {
        Skill {
            name: "my-skill".to_string(),
            path: PathBuf::from("/skills/my-skill"),
            sources,
            auto_update: false,
        }
    }

    #[test]
    fn skill_with_no_sources_is_not_stale() {
        let store = Store::open_in_memory().unwrap();
        let report = freshness(&store, &skill(Vec::new()), Duration::from_secs(3600));
        assert!(!report.is_stale);
        assert!(report.last_checked.is_none());
    }

    #[test]
    fn unknown_skill_degrades_gracefully_instead_of_panicking() {
        let store = Store::open_in_memory().unwrap();
        let report = freshness(&store, &skill(vec!["ghost-source".to_string()]), Duration::from_secs(60));
        assert!(report.is_stale);
    }
}
