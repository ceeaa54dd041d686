//! Drives a skill update through staging, external application, and
//! validation gating (§4.5). Split into two calls rather than one
//! monolithic run because apply-local/create-pr modes hand off to an
//! external applier between staging and validation (§6.5): the caller
//! invokes `stage()`, waits for that applier out of band, then calls
//! `validate_and_gate()`. `run()` is a convenience for callers (such as
//! this repo's own CLI) that have no external applier and want both
//! halves back to back.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Utc};
use cdc_core::config::Skill;
use cdc_store::{Store, UpdateStatus};

use crate::backup;
use crate::context;
use crate::error::Result;
use crate::lock::SkillLock;
use crate::validator;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    ReportOnly,
    ApplyLocal,
    CreatePr,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::ReportOnly => "report-only",
            Mode::ApplyLocal => "apply-local",
            Mode::CreatePr => "create-pr",
        }
    }
}

#[derive(Debug, Clone)]
pub enum OrchestratorOutcome {
    NoOp,
    Applied { context_path: PathBuf },
    RolledBack { reason: String },
    Failed { reason: String },
}

/// Output of `stage()`: the hand-off artifact for an external applier.
#[derive(Debug, Clone)]
pub struct StagedUpdate {
    pub context_path: PathBuf,
    pub backup_path: Option<PathBuf>,
}

/// Steps 1-3: collect pending changes, generate the context document, and
/// (unless report-only) back up the skill directory. Returns `Ok(None)` if
/// there are no pending changes — nothing to stage.
pub fn stage(store: &Store, skill: &Skill, mode: Mode) -> Result<Option<StagedUpdate>> {
    let since = store
        .last_applied_at(&skill.name)?
        .unwrap_or(DateTime::<Utc>::MIN_UTC);
    let changes = store.pending_changes_for_skill(&skill.name, since)?;
    if changes.is_empty() {
        return Ok(None);
    }

    let skill_body = read_skill_body(&skill.path)?;
    let doc = context::generate(store, &skill.name, &skill_body, &changes);
    let context_path = skill.path.with_extension("context.md");
    fs::write(&context_path, doc)?;

    let backup_path = if mode == Mode::ReportOnly {
        None
    } else {
        let path = backup::create_backup(&skill.path)?;
        Some(path)
    };

    store.record_update_attempt(
        &skill.name,
        mode.as_str(),
        UpdateStatus::Staged,
        backup_path.as_ref().map(|p| p.display().to_string()),
    )?;

    Ok(Some(StagedUpdate {
        context_path,
        backup_path,
    }))
}

/// Steps 4-6: validate (the current skill in report-only, or the skill as
/// left by the external applier otherwise), then gate on the result. Any
/// unexpected error after a backup was taken restores it before propagating.
pub fn validate_and_gate(
    store: &Store,
    skill: &Skill,
    mode: Mode,
    staged: &StagedUpdate,
    validator_command: &str,
) -> Result<OrchestratorOutcome> {
    match validate_and_gate_inner(store, skill, mode, staged, validator_command) {
        Ok(outcome) => Ok(outcome),
        Err(err) => {
            if let Some(backup_path) = &staged.backup_path {
                let _ = backup::restore_backup(&skill.path, backup_path);
                let _ = backup::remove_backup(backup_path);
            }
            Err(err)
        }
    }
}

fn validate_and_gate_inner(
    store: &Store,
    skill: &Skill,
    mode: Mode,
    staged: &StagedUpdate,
    validator_command: &str,
) -> Result<OrchestratorOutcome> {
    let outcome = validator::validate_skill(validator_command, &skill.path)?;
    let validated_at = Utc::now();
    let error_detail = outcome.errors.join("; ");
    store.record_validation(
        &skill.name,
        validated_at,
        outcome.is_valid(),
        outcome.errors.len() as u32,
        outcome.warnings.len() as u32,
        &error_detail,
    )?;
    cdc_core::obs::emit_validation_result(&skill.name, outcome.is_valid(), outcome.errors.len());

    let backup_path_str = staged.backup_path.as_ref().map(|p| p.display().to_string());

    match (&staged.backup_path, outcome.is_valid()) {
        (Some(backup_path), false) => {
            backup::restore_backup(&skill.path, backup_path)?;
            backup::remove_backup(backup_path)?;
            store.record_update_attempt(&skill.name, mode.as_str(), UpdateStatus::RolledBack, backup_path_str)?;
            cdc_core::obs::emit_update_rolled_back(&skill.name, mode.as_str(), &error_detail);
            Ok(OrchestratorOutcome::RolledBack { reason: error_detail })
        }
        (Some(backup_path), true) => {
            backup::remove_backup(backup_path)?;
            store.record_update_attempt(&skill.name, mode.as_str(), UpdateStatus::Applied, backup_path_str)?;
            cdc_core::obs::emit_update_applied(&skill.name, mode.as_str());
            Ok(OrchestratorOutcome::Applied {
                context_path: staged.context_path.clone(),
            })
        }
        (None, false) => {
            store.record_update_attempt(&skill.name, mode.as_str(), UpdateStatus::Failed, backup_path_str)?;
            Ok(OrchestratorOutcome::Failed { reason: error_detail })
        }
        (None, true) => {
            store.record_update_attempt(&skill.name, mode.as_str(), UpdateStatus::Applied, backup_path_str)?;
            cdc_core::obs::emit_update_applied(&skill.name, mode.as_str());
            Ok(OrchestratorOutcome::Applied {
                context_path: staged.context_path.clone(),
            })
        }
    }
}

/// Convenience wrapper for callers with no external applier of their own:
/// stages, then immediately validates and gates, holding a `SkillLock` for
/// the duration so a second concurrent run against the same skill fails
/// fast rather than racing the backup/restore dance.
pub fn run(store: &Store, skill: &Skill, mode: Mode, validator_command: &str) -> Result<OrchestratorOutcome> {
    let lock = match SkillLock::acquire(&skill.path) {
        Ok(lock) => lock,
        Err(err) => {
            cdc_core::obs::emit_skill_busy(&skill.name);
            return Err(err);
        }
    };

    let staged = match stage(store, skill, mode)? {
        Some(staged) => staged,
        None => return Ok(OrchestratorOutcome::NoOp),
    };

    let outcome = validate_and_gate(store, skill, mode, &staged, validator_command);
    drop(lock);
    outcome
}

fn read_skill_body(skill_path: &Path) -> Result<String> {
    if skill_path.is_file() {
        return Ok(fs::read_to_string(skill_path)?);
    }

    let mut body = String::new();
    let mut entries: Vec<_> = fs::read_dir(skill_path)?.filter_map(|e| e.ok()).collect();
    entries.sort_by_key(|e| e.file_name());
    for entry in entries {
        let path = entry.path();
        if path.is_file() {
            if let Ok(content) = fs::read_to_string(&path) {
                body.push_str(&format!("### {}\n\n", path.display()));
                body.push_str(&content);
                body.push_str("\n\n");
            }
        }
    }
    Ok(body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cdc_core::classify::Classification;

    fn make_skill(path: PathBuf) -> Skill {
        Skill {
            name: "my-skill".to_string(),
            path,
            sources: vec!["upstream".to_string()],
            auto_update: true,
        }
    }

    fn seed_pending_change(store: &Store, skill_path: &Path, skill_name: &str) {
        let config = cdc_core::config::Config {
            sources: vec![cdc_core::config::Source {
                name: "upstream".to_string(),
                kind: cdc_core::config::SourceKind::Docs {
                    bundle_url: "https://example.invalid/bundle".to_string(),
                    pages: vec![],
                    page_delimiter: "Source: ".to_string(),
                },
            }],
            skills: vec![Skill {
                name: skill_name.to_string(),
                path: skill_path.to_path_buf(),
                sources: vec!["upstream".to_string()],
                auto_update: true,
            }],
            budget_thresholds: Default::default(),
            freshness_threshold: Duration::from_secs(7 * 24 * 3600),
        };
        store.sync_config(&config).unwrap();

        store.cas_put("oldh", "old content").unwrap();
        store.cas_put("newh", "new content removed api").unwrap();
        store
            .record_change(
                "upstream",
                "page-a",
                Utc::now(),
                Classification::Breaking,
                "oldh",
                "newh",
                "BREAKING change detected",
            )
            .unwrap();
    }

    #[test]
    fn no_pending_changes_yields_noop() {
        let store = Store::open_in_memory().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let skill_path = dir.path().join("my-skill");
        fs::create_dir_all(&skill_path).unwrap();
        let config = cdc_core::config::Config {
            sources: vec![],
            skills: vec![Skill {
                name: "my-skill".to_string(),
                path: skill_path.clone(),
                sources: vec![],
                auto_update: true,
            }],
            budget_thresholds: Default::default(),
            freshness_threshold: Duration::from_secs(7 * 24 * 3600),
        };
        store.sync_config(&config).unwrap();
        let skill = make_skill(skill_path);

        let outcome = run(&store, &skill, Mode::ApplyLocal, "true").unwrap();
        assert!(matches!(outcome, OrchestratorOutcome::NoOp));
    }

    #[test]
    fn failing_validator_rolls_back_apply_local() {
        let store = Store::open_in_memory().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let skill_path = dir.path().join("my-skill");
        fs::create_dir_all(&skill_path).unwrap();
        fs::write(skill_path.join("SKILL.md"), "original body").unwrap();

        seed_pending_change(&store, &skill_path, "my-skill");
        let skill = make_skill(skill_path.clone());

        let staged = stage(&store, &skill, Mode::ApplyLocal).unwrap().unwrap();
        assert!(staged.backup_path.is_some());

        fs::write(skill_path.join("SKILL.md"), "mutated by external applier").unwrap();

        let outcome = validate_and_gate(&store, &skill, Mode::ApplyLocal, &staged, "false").unwrap();
        assert!(matches!(outcome, OrchestratorOutcome::RolledBack { .. }));

        let restored = fs::read_to_string(skill_path.join("SKILL.md")).unwrap();
        assert_eq!(restored, "original body");
        assert!(!backup::backup_path_for(&skill_path).exists());
    }

    #[test]
    fn passing_validator_applies_and_removes_backup() {
        let store = Store::open_in_memory().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let skill_path = dir.path().join("my-skill");
        fs::create_dir_all(&skill_path).unwrap();
        fs::write(skill_path.join("SKILL.md"), "original body").unwrap();

        seed_pending_change(&store, &skill_path, "my-skill");
        let skill = make_skill(skill_path.clone());

        let staged = stage(&store, &skill, Mode::ApplyLocal).unwrap().unwrap();
        fs::write(skill_path.join("SKILL.md"), "updated by external applier").unwrap();

        let outcome = validate_and_gate(&store, &skill, Mode::ApplyLocal, &staged, "true").unwrap();
        assert!(matches!(outcome, OrchestratorOutcome::Applied { .. }));

        let final_body = fs::read_to_string(skill_path.join("SKILL.md")).unwrap();
        assert_eq!(final_body, "updated by external applier");
        assert!(!backup::backup_path_for(&skill_path).exists());
    }
}
