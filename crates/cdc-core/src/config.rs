//! Typed configuration.
//!
//! The on-disk document is loosely typed YAML (§6.1): unknown keys are
//! accepted and ignored, but a value that is well-formed-but-incomplete for
//! its declared `type` is a fatal configuration error. We therefore parse in
//! two stages: `RawConfig` mirrors the document shape field-for-field with
//! everything optional, then `RawConfig::validate` lowers it into the
//! strict `Config` the rest of the pipeline consumes.

use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{CdcError, Result};

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct RawConfig {
    #[serde(default)]
    pub sources: Vec<RawSource>,
    #[serde(default)]
    pub skills: Vec<RawSkill>,
    #[serde(default)]
    pub budget: RawBudget,
    #[serde(default)]
    pub freshness: RawFreshness,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct RawSource {
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub bundle_url: Option<String>,
    #[serde(default)]
    pub pages: Vec<String>,
    pub page_delimiter: Option<String>,
    pub repo_url: Option<String>,
    #[serde(default)]
    pub watched_paths: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct RawSkill {
    pub name: Option<String>,
    pub path: Option<String>,
    #[serde(default)]
    pub sources: Vec<String>,
    #[serde(default)]
    pub auto_update: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct RawBudget {
    #[serde(default)]
    pub thresholds: HashMap<String, u64>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct RawFreshness {
    pub threshold: Option<String>,
}

impl RawConfig {
    pub fn from_yaml_str(text: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(text)?)
    }

    /// Lower the loosely typed document into a strict `Config`. Fatal at
    /// start-up on any missing required key or dangling reference (§7,
    /// "Configuration" row).
    pub fn validate(self) -> Result<Config> {
        let mut sources = Vec::with_capacity(self.sources.len());
        let mut source_names = std::collections::HashSet::new();
        for raw in self.sources {
            let name = raw
                .name
                .ok_or_else(|| CdcError::Config("source missing 'name'".into()))?;
            let kind = raw
                .kind
                .as_deref()
                .ok_or_else(|| CdcError::Config(format!("source '{name}' missing 'type'")))?;
            let detail = match kind {
                "docs" => {
                    let bundle_url = raw.bundle_url.ok_or_else(|| {
                        CdcError::Config(format!("docs source '{name}' missing 'bundle_url'"))
                    })?;
                    let page_delimiter = raw.page_delimiter.ok_or_else(|| {
                        CdcError::Config(format!("docs source '{name}' missing 'page_delimiter'"))
                    })?;
                    SourceKind::Docs {
                        bundle_url,
                        pages: raw.pages,
                        page_delimiter,
                    }
                }
                "git" => {
                    let repo_url = raw.repo_url.ok_or_else(|| {
                        CdcError::Config(format!("git source '{name}' missing 'repo_url'"))
                    })?;
                    SourceKind::Git {
                        repo_url,
                        watched_paths: raw.watched_paths,
                    }
                }
                other => {
                    return Err(CdcError::Config(format!(
                        "source '{name}' has unknown type '{other}' (expected 'docs' or 'git')"
                    )))
                }
            };
            if !source_names.insert(name.clone()) {
                return Err(CdcError::Config(format!("duplicate source name '{name}'")));
            }
            sources.push(Source { name, kind: detail });
        }

        let mut skills = Vec::with_capacity(self.skills.len());
        for raw in self.skills {
            let name = raw
                .name
                .ok_or_else(|| CdcError::Config("skill missing 'name'".into()))?;
            let path = raw
                .path
                .ok_or_else(|| CdcError::Config(format!("skill '{name}' missing 'path'")))?;
            for dep in &raw.sources {
                if !source_names.contains(dep) {
                    return Err(CdcError::Config(format!(
                        "skill '{name}' depends on unknown source '{dep}'"
                    )));
                }
            }
            skills.push(Skill {
                name,
                path: path.into(),
                sources: raw.sources,
                auto_update: raw.auto_update,
            });
        }

        let freshness_threshold = match self.freshness.threshold {
            Some(s) => parse_duration(&s)?,
            None => Duration::from_secs(7 * 24 * 3600),
        };

        Ok(Config {
            sources,
            skills,
            budget_thresholds: self.budget.thresholds,
            freshness_threshold,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceKind {
    Docs {
        bundle_url: String,
        pages: Vec<String>,
        page_delimiter: String,
    },
    Git {
        repo_url: String,
        watched_paths: Vec<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Source {
    pub name: String,
    pub kind: SourceKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Skill {
    pub name: String,
    pub path: std::path::PathBuf,
    pub sources: Vec<String>,
    pub auto_update: bool,
}

/// Strict configuration: the value `sync_config` consumes.
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub sources: Vec<Source>,
    pub skills: Vec<Skill>,
    pub budget_thresholds: HashMap<String, u64>,
    pub freshness_threshold: Duration,
}

/// Parse a duration string like `"7d"`, `"30m"`, `"12h"`, `"45s"`.
pub fn parse_duration(s: &str) -> Result<Duration> {
    let s = s.trim();
    if s.is_empty() {
        return Err(CdcError::Config("empty duration string".into()));
    }
    let (digits, unit) = s.split_at(s.len() - 1);
    let n: u64 = digits
        .parse()
        .map_err(|_| CdcError::Config(format!("invalid duration '{s}'")))?;
    let secs = match unit {
        "s" => n,
        "m" => n * 60,
        "h" => n * 3600,
        "d" => n * 86400,
        _ => return Err(CdcError::Config(format!("invalid duration unit in '{s}'"))),
    };
    Ok(Duration::from_secs(secs))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_document() {
        let yaml = r#"
sources:
  - name: rust-docs
    type: docs
    bundle_url: https://example.com/bundle.txt
    page_delimiter: "Source: "
    pages: []
  - name: rust-repo
    type: git
    repo_url: https://example.com/repo.git
    watched_paths: ["src/lib.rs"]
skills:
  - name: my-skill
    path: /skills/my-skill
    sources: [rust-docs, rust-repo]
    auto_update: true
budget:
  thresholds:
    md: 4000
freshness:
  threshold: "7d"
"#;
        let cfg = RawConfig::from_yaml_str(yaml).unwrap().validate().unwrap();
        assert_eq!(cfg.sources.len(), 2);
        assert_eq!(cfg.skills.len(), 1);
        assert_eq!(cfg.freshness_threshold, Duration::from_secs(7 * 86400));
        assert_eq!(cfg.budget_thresholds.get("md"), Some(&4000));
    }

    #[test]
    fn unknown_keys_are_ignored() {
        let yaml = r#"
sources: []
skills: []
totally_unrecognized_option: true
"#;
        assert!(RawConfig::from_yaml_str(yaml).unwrap().validate().is_ok());
    }

    #[test]
    fn missing_bundle_url_is_fatal() {
        let yaml = r#"
sources:
  - name: bad
    type: docs
    page_delimiter: "Source: "
"#;
        let err = RawConfig::from_yaml_str(yaml)
            .unwrap()
            .validate()
            .unwrap_err();
        assert!(matches!(err, CdcError::Config(_)));
    }

    #[test]
    fn skill_referencing_unknown_source_is_fatal() {
        let yaml = r#"
sources: []
skills:
  - name: s
    path: /tmp/s
    sources: [ghost]
"#;
        assert!(RawConfig::from_yaml_str(yaml)
            .unwrap()
            .validate()
            .is_err());
    }

    #[test]
    fn duration_units() {
        assert_eq!(parse_duration("7d").unwrap(), Duration::from_secs(604800));
        assert_eq!(parse_duration("12h").unwrap(), Duration::from_secs(43200));
        assert_eq!(parse_duration("30m").unwrap(), Duration::from_secs(1800));
        assert_eq!(parse_duration("45s").unwrap(), Duration::from_secs(45));
        assert!(parse_duration("nope").is_err());
    }
}
