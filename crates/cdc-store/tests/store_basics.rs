use std::collections::HashMap;

use cdc_core::classify::Classification;
use cdc_core::config::{RawConfig, Source, SourceKind, Skill};
use cdc_store::Store;

fn docs_config() -> cdc_core::config::Config {
    cdc_core::config::Config {
        sources: vec![Source {
            name: "rust-docs".to_string(),
            kind: SourceKind::Docs {
                bundle_url: "https://example.com/bundle.txt".to_string(),
                pages: vec![],
                page_delimiter: "Source: ".to_string(),
            },
        }],
        skills: vec![Skill {
            name: "my-skill".to_string(),
            path: "/skills/my-skill".into(),
            sources: vec!["rust-docs".to_string()],
            auto_update: false,
        }],
        budget_thresholds: HashMap::new(),
        freshness_threshold: std::time::Duration::from_secs(7 * 86400),
    }
}

#[test]
fn sync_config_is_idempotent() {
    let store = Store::open_in_memory().unwrap();
    let cfg = docs_config();
    store.sync_config(&cfg).unwrap();
    store.sync_config(&cfg).unwrap();

    let freshness = store.skill_freshness("my-skill").unwrap();
    assert_eq!(freshness.skill_name, "my-skill");
}

#[test]
fn record_change_is_idempotent_for_same_hash() {
    let store = Store::open_in_memory().unwrap();
    store.sync_config(&docs_config()).unwrap();

    let now = chrono::Utc::now();
    let first = store
        .record_change(
            "rust-docs",
            "https://example.com/p1",
            now,
            Classification::Additive,
            "",
            "hash-a",
            "initial capture",
        )
        .unwrap();
    let second = store
        .record_change(
            "rust-docs",
            "https://example.com/p1",
            now,
            Classification::Additive,
            "",
            "hash-a",
            "initial capture",
        )
        .unwrap();

    assert_eq!(first.id, second.id);
}

#[test]
fn change_chain_is_hash_linked() {
    let store = Store::open_in_memory().unwrap();
    store.sync_config(&docs_config()).unwrap();

    let t0 = chrono::Utc::now();
    let t1 = t0 + chrono::Duration::seconds(1);

    let first = store
        .record_change(
            "rust-docs",
            "https://example.com/p1",
            t0,
            Classification::Additive,
            "",
            "hash-a",
            "initial capture",
        )
        .unwrap();
    let second = store
        .record_change(
            "rust-docs",
            "https://example.com/p1",
            t1,
            Classification::Breaking,
            "hash-a",
            "hash-b",
            "removed the foo parameter",
        )
        .unwrap();

    assert_eq!(first.old_hash, "");
    assert_eq!(second.old_hash, first.new_hash);
}

#[test]
fn record_change_rejects_unknown_source() {
    let store = Store::open_in_memory().unwrap();
    let result = store.record_change(
        "does-not-exist",
        "https://example.com/p1",
        chrono::Utc::now(),
        Classification::Additive,
        "",
        "hash-a",
        "x",
    );
    assert!(result.is_err());
}

#[test]
fn freshness_for_unknown_skill_is_well_formed() {
    let store = Store::open_in_memory().unwrap();
    let freshness = store.skill_freshness("ghost").unwrap();
    assert_eq!(freshness.last_checked, None);
    assert_eq!(freshness.breaking_since_validation, 0);
}

#[test]
fn budget_flags_over_threshold_filetype() {
    let store = Store::open_in_memory().unwrap();
    store.sync_config(&docs_config()).unwrap();
    store
        .record_content_measurement("my-skill", "SKILL.md", 500, 5000)
        .unwrap();

    let mut thresholds = HashMap::new();
    thresholds.insert("md".to_string(), 4000u64);

    let budget = store.skill_budget("my-skill", &thresholds).unwrap();
    assert!(budget.over_budget);
    assert!(budget.by_filetype["md"].over_budget);
}

#[test]
fn raw_config_round_trips_into_store() {
    let yaml = r#"
sources:
  - name: rust-docs
    type: docs
    bundle_url: https://example.com/bundle.txt
    page_delimiter: "Source: "
skills:
  - name: my-skill
    path: /skills/my-skill
    sources: [rust-docs]
"#;
    let cfg = RawConfig::from_yaml_str(yaml).unwrap().validate().unwrap();
    let store = Store::open_in_memory().unwrap();
    store.sync_config(&cfg).unwrap();
    assert!(store.latest_watermark("rust-docs").unwrap().is_none());
}
