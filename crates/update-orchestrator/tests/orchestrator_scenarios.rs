use std::fs;
use std::time::Duration;

use cdc_core::classify::Classification;
use cdc_core::config::{Config, Skill, Source, SourceKind};
use cdc_store::Store;
use update_orchestrator::orchestrator::{stage, validate_and_gate, Mode, OrchestratorOutcome};

fn seed(store: &Store, skill_path: &std::path::Path) {
    let config = Config {
        sources: vec![Source {
            name: "upstream".to_string(),
            kind: SourceKind::Docs {
                bundle_url: "https://example.invalid/bundle".to_string(),
                pages: vec![],
                page_delimiter: "Source: ".to_string(),
            },
        }],
        skills: vec![Skill {
            name: "my-skill".to_string(),
            path: skill_path.to_path_buf(),
            sources: vec!["upstream".to_string()],
            auto_update: true,
        }],
        budget_thresholds: Default::default(),
        freshness_threshold: Duration::from_secs(604_800),
    };
    store.sync_config(&config).unwrap();
    store.cas_put("oldh", "the widget has a reset() method").unwrap();
    store
        .cas_put("newh", "reset() is removed; use clear() instead")
        .unwrap();
    store
        .record_change(
            "upstream",
            "page-a",
            chrono::Utc::now(),
            Classification::Breaking,
            "oldh",
            "newh",
            "BREAKING: reset() removed",
        )
        .unwrap();
}

fn the_skill(skill_path: std::path::PathBuf) -> Skill {
    Skill {
        name: "my-skill".to_string(),
        path: skill_path,
        sources: vec!["upstream".to_string()],
        auto_update: true,
    }
}

#[test]
fn scenario_d_failed_validation_rolls_back_and_leaves_no_backup() {
    let store = Store::open_in_memory().unwrap();
    let dir = tempfile::tempdir().unwrap();
    let skill_path = dir.path().join("my-skill");
    fs::create_dir_all(&skill_path).unwrap();
    fs::write(skill_path.join("SKILL.md"), "use widget.reset() to clear state").unwrap();

    seed(&store, &skill_path);
    let skill = the_skill(skill_path.clone());

    let staged = stage(&store, &skill, Mode::ApplyLocal).unwrap().unwrap();
    assert!(staged.context_path.exists());
    assert!(staged.backup_path.is_some());

    fs::write(skill_path.join("SKILL.md"), "use widget.clear() to clear state").unwrap();

    let outcome = validate_and_gate(&store, &skill, Mode::ApplyLocal, &staged, "false").unwrap();
    assert!(matches!(outcome, OrchestratorOutcome::RolledBack { .. }));

    let body = fs::read_to_string(skill_path.join("SKILL.md")).unwrap();
    assert_eq!(body, "use widget.reset() to clear state");
    assert!(!staged.backup_path.unwrap().exists());
}

#[test]
fn scenario_e_successful_validation_applies_and_removes_backup() {
    let store = Store::open_in_memory().unwrap();
    let dir = tempfile::tempdir().unwrap();
    let skill_path = dir.path().join("my-skill");
    fs::create_dir_all(&skill_path).unwrap();
    fs::write(skill_path.join("SKILL.md"), "use widget.reset() to clear state").unwrap();

    seed(&store, &skill_path);
    let skill = the_skill(skill_path.clone());

    let staged = stage(&store, &skill, Mode::ApplyLocal).unwrap().unwrap();
    fs::write(skill_path.join("SKILL.md"), "use widget.clear() to clear state").unwrap();

    let outcome = validate_and_gate(&store, &skill, Mode::ApplyLocal, &staged, "true").unwrap();
    assert!(matches!(outcome, OrchestratorOutcome::Applied { .. }));

    let body = fs::read_to_string(skill_path.join("SKILL.md")).unwrap();
    assert_eq!(body, "use widget.clear() to clear state");
    assert!(!staged.backup_path.unwrap().exists());
}

#[test]
fn report_only_mode_never_backs_up_but_still_validates() {
    let store = Store::open_in_memory().unwrap();
    let dir = tempfile::tempdir().unwrap();
    let skill_path = dir.path().join("my-skill");
    fs::create_dir_all(&skill_path).unwrap();
    fs::write(skill_path.join("SKILL.md"), "use widget.reset() to clear state").unwrap();

    seed(&store, &skill_path);
    let skill = the_skill(skill_path.clone());

    let staged = stage(&store, &skill, Mode::ReportOnly).unwrap().unwrap();
    assert!(staged.backup_path.is_none());

    let outcome = validate_and_gate(&store, &skill, Mode::ReportOnly, &staged, "true").unwrap();
    assert!(matches!(outcome, OrchestratorOutcome::Applied { .. }));
}
