//! Schema definition and forward-only migrations (§4.1, §6.2).
//!
//! A single integer in the `schema_version` table tracks the applied
//! version. Each step below is idempotent (SurrealDB's `DEFINE ... IF NOT
//! EXISTS` semantics on re-run) so re-opening a store at the current
//! version is a safe no-op, mirroring the teacher's `init_schema`.

use surrealdb::engine::any::Any;
use surrealdb::Surreal;

use crate::error::{Result, StoreError};

pub const CURRENT_VERSION: i64 = 1;

pub async fn init_schema(db: &Surreal<Any>) -> Result<()> {
    define_schema_version(db).await?;
    define_dimensions(db).await?;
    define_facts(db).await?;

    let version = current_version(db).await?;
    if version < CURRENT_VERSION {
        apply_migrations(db, version).await?;
    }
    Ok(())
}

async fn define_schema_version(db: &Surreal<Any>) -> Result<()> {
    db.query(
        r#"
        DEFINE TABLE schema_version SCHEMAFULL;
        DEFINE FIELD version ON schema_version TYPE int;
        "#,
    )
    .await?;
    Ok(())
}

async fn current_version(db: &Surreal<Any>) -> Result<i64> {
    #[derive(serde::Deserialize)]
    struct Row {
        version: i64,
    }
    let mut result = db.query("SELECT version FROM schema_version LIMIT 1").await?;
    let rows: Vec<Row> = result.take(0)?;
    Ok(rows.into_iter().next().map(|r| r.version).unwrap_or(0))
}

/// Apply migration steps in order, starting just above `from_version`.
/// Any failure aborts before the version marker is advanced, leaving the
/// store at its prior version (§4.1 "Migrations").
async fn apply_migrations(db: &Surreal<Any>, from_version: i64) -> Result<()> {
    if from_version < 1 {
        migrate_to_v1(db).await.map_err(|e| StoreError::Migration {
            version: 1,
            message: e.to_string(),
        })?;
    }

    db.query("DELETE schema_version; CREATE schema_version SET version = $v")
        .bind(("v", CURRENT_VERSION))
        .await?;
    Ok(())
}

async fn migrate_to_v1(_db: &Surreal<Any>) -> Result<()> {
    // v1 is the initial schema; dimensions and facts are already defined by
    // `define_dimensions`/`define_facts` above, so there is nothing further
    // to backfill. Later versions would alter/backfill columns here.
    Ok(())
}

async fn define_dimensions(db: &Surreal<Any>) -> Result<()> {
    db.query(
        r#"
        DEFINE TABLE sources SCHEMAFULL;
        DEFINE FIELD name ON sources TYPE string;
        DEFINE FIELD kind ON sources TYPE string;
        DEFINE FIELD url ON sources TYPE string;
        DEFINE FIELD config ON sources FLEXIBLE TYPE object;
        DEFINE INDEX idx_sources_name ON sources FIELDS name UNIQUE;

        DEFINE TABLE skills SCHEMAFULL;
        DEFINE FIELD name ON skills TYPE string;
        DEFINE FIELD path ON skills TYPE string;
        DEFINE FIELD auto_update ON skills TYPE bool;
        DEFINE INDEX idx_skills_name ON skills FIELDS name UNIQUE;

        DEFINE TABLE pages SCHEMAFULL;
        DEFINE FIELD natural_id ON pages TYPE string;
        DEFINE FIELD source_id ON pages TYPE string;
        DEFINE FIELD url ON pages TYPE string;
        DEFINE FIELD first_seen_at ON pages TYPE datetime;
        DEFINE INDEX idx_pages_natural_id ON pages FIELDS natural_id UNIQUE;
        DEFINE INDEX idx_pages_source ON pages FIELDS source_id;

        DEFINE TABLE skill_source_deps SCHEMAFULL;
        DEFINE FIELD skill_id ON skill_source_deps TYPE string;
        DEFINE FIELD source_id ON skill_source_deps TYPE string;
        DEFINE INDEX idx_deps_skill ON skill_source_deps FIELDS skill_id;
        DEFINE INDEX idx_deps_pair ON skill_source_deps FIELDS skill_id, source_id UNIQUE;

        DEFINE TABLE page_bodies SCHEMAFULL;
        DEFINE FIELD digest ON page_bodies TYPE string;
        DEFINE FIELD content ON page_bodies TYPE string;
        DEFINE INDEX idx_page_bodies_digest ON page_bodies FIELDS digest UNIQUE;
        "#,
    )
    .await?;
    Ok(())
}

async fn define_facts(db: &Surreal<Any>) -> Result<()> {
    db.query(
        r#"
        DEFINE TABLE watermark_checks SCHEMAFULL;
        DEFINE FIELD source_id ON watermark_checks TYPE string;
        DEFINE FIELD checked_at ON watermark_checks TYPE datetime;
        DEFINE FIELD last_modified ON watermark_checks TYPE option<string>;
        DEFINE FIELD etag ON watermark_checks TYPE option<string>;
        DEFINE FIELD changed ON watermark_checks TYPE bool;
        DEFINE FIELD created_at ON watermark_checks TYPE datetime;
        DEFINE INDEX idx_watermark_source ON watermark_checks FIELDS source_id, checked_at;

        DEFINE TABLE changes SCHEMAFULL;
        DEFINE FIELD source_id ON changes TYPE string;
        DEFINE FIELD page_id ON changes TYPE string;
        DEFINE FIELD detected_at ON changes TYPE datetime;
        DEFINE FIELD classification ON changes TYPE string;
        DEFINE FIELD old_hash ON changes TYPE string;
        DEFINE FIELD new_hash ON changes TYPE string;
        DEFINE FIELD summary ON changes TYPE string;
        DEFINE FIELD created_at ON changes TYPE datetime;
        DEFINE INDEX idx_changes_page ON changes FIELDS page_id, detected_at;

        DEFINE TABLE validations SCHEMAFULL;
        DEFINE FIELD skill_id ON validations TYPE string;
        DEFINE FIELD validated_at ON validations TYPE datetime;
        DEFINE FIELD is_valid ON validations TYPE bool;
        DEFINE FIELD error_count ON validations TYPE int;
        DEFINE FIELD warning_count ON validations TYPE int;
        DEFINE FIELD error_detail ON validations TYPE string;
        DEFINE FIELD created_at ON validations TYPE datetime;
        DEFINE INDEX idx_validations_skill ON validations FIELDS skill_id, validated_at;

        DEFINE TABLE update_attempts SCHEMAFULL;
        DEFINE FIELD skill_id ON update_attempts TYPE string;
        DEFINE FIELD mode ON update_attempts TYPE string;
        DEFINE FIELD status ON update_attempts TYPE string;
        DEFINE FIELD backup_path ON update_attempts TYPE option<string>;
        DEFINE FIELD created_at ON update_attempts TYPE datetime;
        DEFINE INDEX idx_update_attempts_skill ON update_attempts FIELDS skill_id, created_at;

        DEFINE TABLE content_measurements SCHEMAFULL;
        DEFINE FIELD skill_id ON content_measurements TYPE string;
        DEFINE FIELD file_path ON content_measurements TYPE string;
        DEFINE FIELD line_count ON content_measurements TYPE int;
        DEFINE FIELD estimated_tokens ON content_measurements TYPE int;
        DEFINE FIELD created_at ON content_measurements TYPE datetime;
        DEFINE INDEX idx_measurements_skill ON content_measurements FIELDS skill_id, created_at;

        DEFINE TABLE session_events SCHEMAFULL;
        DEFINE FIELD session_id ON session_events TYPE string;
        DEFINE FIELD event_type ON session_events TYPE string;
        DEFINE FIELD target ON session_events TYPE string;
        DEFINE FIELD metadata ON session_events FLEXIBLE TYPE object;
        DEFINE FIELD created_at ON session_events TYPE datetime;
        DEFINE INDEX idx_session_events_target ON session_events FIELDS target, created_at;
        "#,
    )
    .await?;
    Ok(())
}
