//! `Store`: the embedded columnar database handle (§4.1).
//!
//! Resolves the blocking-pipeline design note (SPEC_FULL.md §1) by wrapping
//! an async SurrealDB connection (`surrealdb::engine::any`, matching the
//! teacher's `SurrealHandle`/`SurrealRunLedger`) behind a synchronous
//! facade: `Store` owns a single-threaded `tokio::runtime::Runtime` and
//! every public method blocks on it internally. Every caller outside this
//! crate sees plain, non-async functions.

use std::collections::HashMap;
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use surrealdb::engine::any::{self, Any};
use surrealdb::Surreal;

use cdc_core::classify::Classification;
use cdc_core::config::{Config, SourceKind};

use crate::error::{Result, StoreError};
use crate::migrations;
use crate::schema::*;
use crate::views::{FileTypeBudget, SkillBudget, SkillFreshness, SourceCheckSummary};

const NAMESPACE: &str = "skill_cdc";
const DATABASE: &str = "main";

/// Advisory OS-level lock enforcing single-writer access to an on-disk
/// store (§5: "Attempts to open a second writer fail immediately with
/// `StoreLockedError`"). Held for the lifetime of the `Store` handle;
/// removed on drop.
struct FileLock {
    path: PathBuf,
}

impl FileLock {
    fn acquire(db_path: &Path) -> Result<Self> {
        let lock_path = db_path.with_extension("lock");
        OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&lock_path)
            .map_err(|_| StoreError::StoreLocked {
                path: db_path.display().to_string(),
            })?;
        Ok(Self { path: lock_path })
    }
}

impl Drop for FileLock {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.path);
    }
}

pub struct Store {
    rt: tokio::runtime::Runtime,
    db: Surreal<Any>,
    write_lock: Mutex<()>,
    _lock: Option<FileLock>,
}

impl Store {
    /// Open (or create) a file-backed store at `path`, acquiring the
    /// exclusive writer lock.
    pub fn open_on_disk(path: &Path) -> Result<Self> {
        let lock = FileLock::acquire(path)?;
        let endpoint = format!("surrealkv://{}", path.display());
        Self::connect(&endpoint, Some(lock))
    }

    /// Open an in-memory store. No file lock is taken: intended for tests
    /// and for short-lived CLI invocations that don't need persistence
    /// (§9 "testability with in-memory stores").
    pub fn open_in_memory() -> Result<Self> {
        Self::connect("mem://", None)
    }

    fn connect(endpoint: &str, lock: Option<FileLock>) -> Result<Self> {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()
            .map_err(|e| StoreError::Connection(e.to_string()))?;

        let db = rt.block_on(async {
            let db = any::connect(endpoint)
                .await
                .map_err(|e| StoreError::Connection(e.to_string()))?;
            db.use_ns(NAMESPACE)
                .use_db(DATABASE)
                .await
                .map_err(|e| StoreError::Connection(e.to_string()))?;
            migrations::init_schema(&db).await?;
            Ok::<_, StoreError>(db)
        })?;

        Ok(Self {
            rt,
            db,
            write_lock: Mutex::new(()),
            _lock: lock,
        })
    }

    // -----------------------------------------------------------------
    // sync_config
    // -----------------------------------------------------------------

    /// Upsert dimensions and rebuild the skill/source bridge in one call
    /// (§4.1, §3.3). Fails fast with `SchemaLocked` rather than blocking if
    /// another write is already in flight.
    pub fn sync_config(&self, config: &Config) -> Result<()> {
        let _guard = self
            .write_lock
            .try_lock()
            .map_err(|_| StoreError::SchemaLocked)?;
        self.rt.block_on(self.sync_config_async(config))
    }

    async fn sync_config_async(&self, config: &Config) -> Result<()> {
        for source in &config.sources {
            self.upsert_source(source).await?;
        }
        for skill in &config.skills {
            self.upsert_skill(skill).await?;
        }

        self.db.query("DELETE skill_source_deps").await?;
        for skill in &config.skills {
            let skill_id = self
                .find_skill_id(&skill.name)
                .await?
                .ok_or_else(|| StoreError::UnknownSkill(skill.name.clone()))?;
            for dep_name in &skill.sources {
                let source_id = self
                    .find_source_id(dep_name)
                    .await?
                    .ok_or_else(|| StoreError::UnknownSource(dep_name.clone()))?;
                let _: Option<SkillSourceDepRow> = self
                    .db
                    .create("skill_source_deps")
                    .content(SkillSourceDepRow {
                        id: None,
                        skill_id: skill_id.clone(),
                        source_id,
                    })
                    .await?;
            }
        }
        Ok(())
    }

    async fn upsert_source(&self, source: &cdc_core::config::Source) -> Result<()> {
        let (kind, url, extra) = match &source.kind {
            SourceKind::Docs {
                bundle_url,
                pages,
                page_delimiter,
            } => (
                "docs",
                bundle_url.clone(),
                serde_json::json!({ "pages": pages, "page_delimiter": page_delimiter }),
            ),
            SourceKind::Git {
                repo_url,
                watched_paths,
            } => (
                "git",
                repo_url.clone(),
                serde_json::json!({ "watched_paths": watched_paths }),
            ),
        };

        if self.find_source_id(&source.name).await?.is_some() {
            self.db
                .query("UPDATE sources SET kind = $kind, url = $url, config = $config WHERE name = $name")
                .bind(("kind", kind.to_string()))
                .bind(("url", url))
                .bind(("config", extra))
                .bind(("name", source.name.clone()))
                .await?;
        } else {
            let _: Option<SourceRow> = self
                .db
                .create("sources")
                .content(SourceRow {
                    id: None,
                    name: source.name.clone(),
                    kind: kind.to_string(),
                    url,
                    config: extra,
                })
                .await?;
        }
        Ok(())
    }

    async fn upsert_skill(&self, skill: &cdc_core::config::Skill) -> Result<()> {
        if self.find_skill_id(&skill.name).await?.is_some() {
            self.db
                .query("UPDATE skills SET path = $path, auto_update = $auto_update WHERE name = $name")
                .bind(("path", skill.path.display().to_string()))
                .bind(("auto_update", skill.auto_update))
                .bind(("name", skill.name.clone()))
                .await?;
        } else {
            let _: Option<SkillRow> = self
                .db
                .create("skills")
                .content(SkillRow {
                    id: None,
                    name: skill.name.clone(),
                    path: skill.path.display().to_string(),
                    auto_update: skill.auto_update,
                })
                .await?;
        }
        Ok(())
    }

    async fn find_source(&self, name: &str) -> Result<Option<SourceRow>> {
        let mut result = self
            .db
            .query("SELECT * FROM sources WHERE name = $name")
            .bind(("name", name.to_string()))
            .await?;
        let rows: Vec<SourceRow> = result.take(0)?;
        Ok(rows.into_iter().next())
    }

    async fn find_source_id(&self, name: &str) -> Result<Option<String>> {
        Ok(self
            .find_source(name)
            .await?
            .and_then(|r| r.id)
            .map(|id| id.to_string()))
    }

    async fn find_skill(&self, name: &str) -> Result<Option<SkillRow>> {
        let mut result = self
            .db
            .query("SELECT * FROM skills WHERE name = $name")
            .bind(("name", name.to_string()))
            .await?;
        let rows: Vec<SkillRow> = result.take(0)?;
        Ok(rows.into_iter().next())
    }

    async fn find_skill_id(&self, name: &str) -> Result<Option<String>> {
        Ok(self
            .find_skill(name)
            .await?
            .and_then(|r| r.id)
            .map(|id| id.to_string()))
    }

    // -----------------------------------------------------------------
    // Content-addressed page body cache (grounded on the teacher's
    // `CasStore`; see schema::PageBodyRow)
    // -----------------------------------------------------------------

    /// Store `content` keyed by its hash, idempotently. Returns the digest.
    pub fn cas_put(&self, digest: &str, content: &str) -> Result<String> {
        let _guard = self.write_lock.lock().unwrap();
        self.rt.block_on(async {
            if self.cas_get_async(digest).await?.is_some() {
                return Ok(digest.to_string());
            }
            let _: Option<PageBodyRow> = self
                .db
                .create("page_bodies")
                .content(PageBodyRow {
                    id: None,
                    digest: digest.to_string(),
                    content: content.to_string(),
                })
                .await?;
            Ok(digest.to_string())
        })
    }

    pub fn cas_get(&self, digest: &str) -> Result<Option<String>> {
        self.rt.block_on(self.cas_get_async(digest))
    }

    async fn cas_get_async(&self, digest: &str) -> Result<Option<String>> {
        if digest.is_empty() {
            return Ok(None);
        }
        let mut result = self
            .db
            .query("SELECT * FROM page_bodies WHERE digest = $d")
            .bind(("d", digest.to_string()))
            .await?;
        let rows: Vec<PageBodyRow> = result.take(0)?;
        Ok(rows.into_iter().next().map(|r| r.content))
    }

    // -----------------------------------------------------------------
    // record_*
    // -----------------------------------------------------------------

    pub fn record_watermark_check(
        &self,
        source_name: &str,
        checked_at: DateTime<Utc>,
        last_modified: Option<String>,
        etag: Option<String>,
        changed: bool,
    ) -> Result<WatermarkCheckRow> {
        let _guard = self.write_lock.lock().unwrap();
        self.rt.block_on(async {
            let source_id = self
                .find_source_id(source_name)
                .await?
                .ok_or_else(|| StoreError::UnknownSource(source_name.to_string()))?;
            let row = WatermarkCheckRow {
                id: None,
                source_id,
                checked_at,
                last_modified,
                etag,
                changed,
                created_at: Utc::now(),
            };
            let created: Option<WatermarkCheckRow> =
                self.db.create("watermark_checks").content(row).await?;
            created.ok_or_else(|| StoreError::Query("failed to insert watermark_check".into()))
        })
    }

    /// Upsert the `Page` dimension by URL hash, then append one `Change`
    /// fact row. Duplicate-suppressed by `(page_id, new_hash)` (§8.2
    /// property 9): if the most recently recorded hash for this page
    /// already equals `new_hash`, the existing row is returned unchanged.
    #[allow(clippy::too_many_arguments)]
    pub fn record_change(
        &self,
        source_name: &str,
        page_url: &str,
        detected_at: DateTime<Utc>,
        classification: Classification,
        old_hash: &str,
        new_hash: &str,
        summary: &str,
    ) -> Result<ChangeRow> {
        let _guard = self.write_lock.lock().unwrap();
        self.rt.block_on(async {
            let source_id = self
                .find_source_id(source_name)
                .await?
                .ok_or_else(|| StoreError::UnknownSource(source_name.to_string()))?;
            let page_id = self.upsert_page(&source_id, page_url).await?;

            if let Some(existing) = self.latest_change_for_page(&page_id).await? {
                if existing.new_hash == new_hash {
                    return Ok(existing);
                }
            }

            let row = ChangeRow {
                id: None,
                source_id,
                page_id,
                detected_at,
                classification,
                old_hash: old_hash.to_string(),
                new_hash: new_hash.to_string(),
                summary: summary.to_string(),
                created_at: Utc::now(),
            };
            let created: Option<ChangeRow> = self.db.create("changes").content(row).await?;
            created.ok_or_else(|| StoreError::Query("failed to insert change".into()))
        })
    }

    async fn upsert_page(&self, source_id: &str, url: &str) -> Result<String> {
        let natural_id = PageRow::natural_id_for(url);
        let mut result = self
            .db
            .query("SELECT * FROM pages WHERE natural_id = $nid")
            .bind(("nid", natural_id.clone()))
            .await?;
        let rows: Vec<PageRow> = result.take(0)?;
        if let Some(row) = rows.into_iter().next() {
            return Ok(row.id.expect("persisted row has an id").to_string());
        }

        let created: Option<PageRow> = self
            .db
            .create("pages")
            .content(PageRow {
                id: None,
                natural_id,
                source_id: source_id.to_string(),
                url: url.to_string(),
                first_seen_at: Utc::now(),
            })
            .await?;
        Ok(created
            .ok_or_else(|| StoreError::Query("failed to insert page".into()))?
            .id
            .expect("persisted row has an id")
            .to_string())
    }

    async fn latest_change_for_page(&self, page_id: &str) -> Result<Option<ChangeRow>> {
        let mut result = self
            .db
            .query("SELECT * FROM changes WHERE page_id = $pid ORDER BY detected_at DESC LIMIT 1")
            .bind(("pid", page_id.to_string()))
            .await?;
        let rows: Vec<ChangeRow> = result.take(0)?;
        Ok(rows.into_iter().next())
    }

    pub fn record_validation(
        &self,
        skill_name: &str,
        validated_at: DateTime<Utc>,
        is_valid: bool,
        error_count: u32,
        warning_count: u32,
        error_detail: &str,
    ) -> Result<ValidationRow> {
        let _guard = self.write_lock.lock().unwrap();
        self.rt.block_on(async {
            let skill_id = self
                .find_skill_id(skill_name)
                .await?
                .ok_or_else(|| StoreError::UnknownSkill(skill_name.to_string()))?;
            let row = ValidationRow {
                id: None,
                skill_id,
                validated_at,
                is_valid,
                error_count,
                warning_count,
                error_detail: error_detail.to_string(),
                created_at: Utc::now(),
            };
            let created: Option<ValidationRow> = self.db.create("validations").content(row).await?;
            created.ok_or_else(|| StoreError::Query("failed to insert validation".into()))
        })
    }

    pub fn record_update_attempt(
        &self,
        skill_name: &str,
        mode: &str,
        status: UpdateStatus,
        backup_path: Option<String>,
    ) -> Result<UpdateAttemptRow> {
        let _guard = self.write_lock.lock().unwrap();
        self.rt.block_on(async {
            let skill_id = self
                .find_skill_id(skill_name)
                .await?
                .ok_or_else(|| StoreError::UnknownSkill(skill_name.to_string()))?;
            let row = UpdateAttemptRow {
                id: None,
                skill_id,
                mode: mode.to_string(),
                status,
                backup_path,
                created_at: Utc::now(),
            };
            let created: Option<UpdateAttemptRow> =
                self.db.create("update_attempts").content(row).await?;
            created.ok_or_else(|| StoreError::Query("failed to insert update_attempt".into()))
        })
    }

    pub fn record_content_measurement(
        &self,
        skill_name: &str,
        file_path: &str,
        line_count: u64,
        estimated_tokens: u64,
    ) -> Result<ContentMeasurementRow> {
        let _guard = self.write_lock.lock().unwrap();
        self.rt.block_on(async {
            let skill_id = self
                .find_skill_id(skill_name)
                .await?
                .ok_or_else(|| StoreError::UnknownSkill(skill_name.to_string()))?;
            let row = ContentMeasurementRow {
                id: None,
                skill_id,
                file_path: file_path.to_string(),
                line_count,
                estimated_tokens,
                created_at: Utc::now(),
            };
            let created: Option<ContentMeasurementRow> =
                self.db.create("content_measurements").content(row).await?;
            created.ok_or_else(|| StoreError::Query("failed to insert content_measurement".into()))
        })
    }

    pub fn record_session_event(
        &self,
        session_id: &str,
        event_type: &str,
        target: &str,
        metadata: serde_json::Value,
    ) -> Result<SessionEventRow> {
        let _guard = self.write_lock.lock().unwrap();
        self.rt.block_on(async {
            let row = SessionEventRow {
                id: None,
                session_id: session_id.to_string(),
                event_type: event_type.to_string(),
                target: target.to_string(),
                metadata,
                created_at: Utc::now(),
            };
            let created: Option<SessionEventRow> =
                self.db.create("session_events").content(row).await?;
            created.ok_or_else(|| StoreError::Query("failed to insert session_event".into()))
        })
    }

    // -----------------------------------------------------------------
    // Views (§4.1 "Views")
    // -----------------------------------------------------------------

    pub fn latest_watermark(&self, source_name: &str) -> Result<Option<WatermarkCheckRow>> {
        self.rt.block_on(async {
            let source_id = match self.find_source_id(source_name).await? {
                Some(id) => id,
                None => return Ok(None),
            };
            let mut result = self
                .db
                .query(
                    "SELECT * FROM watermark_checks WHERE source_id = $sid ORDER BY checked_at DESC LIMIT 1",
                )
                .bind(("sid", source_id))
                .await?;
            let rows: Vec<WatermarkCheckRow> = result.take(0)?;
            Ok(rows.into_iter().next())
        })
    }

    pub fn latest_page_hash(
        &self,
        source_name: &str,
        page_url: &str,
    ) -> Result<Option<(String, DateTime<Utc>)>> {
        self.rt.block_on(async {
            if self.find_source_id(source_name).await?.is_none() {
                return Ok(None);
            }
            let natural_id = PageRow::natural_id_for(page_url);
            let mut result = self
                .db
                .query("SELECT * FROM pages WHERE natural_id = $nid")
                .bind(("nid", natural_id))
                .await?;
            let pages: Vec<PageRow> = result.take(0)?;
            let page = match pages.into_iter().next() {
                Some(p) => p,
                None => return Ok(None),
            };
            let page_id = page.id.expect("persisted row has an id").to_string();
            Ok(self
                .latest_change_for_page(&page_id)
                .await?
                .map(|c| (c.new_hash, c.detected_at)))
        })
    }

    /// `skill_freshness` (§4.1, §4.4): max `detected_at`/`checked_at` across
    /// the skill's dependent sources, the most recent `validated_at`, and
    /// BREAKING/ADDITIVE counts since that validation.
    pub fn skill_freshness(&self, skill_name: &str) -> Result<SkillFreshness> {
        self.rt.block_on(async {
            let skill_id = match self.find_skill_id(skill_name).await? {
                Some(id) => id,
                None => {
                    return Ok(SkillFreshness {
                        skill_name: skill_name.to_string(),
                        last_checked: None,
                        last_validated_at: None,
                        breaking_since_validation: 0,
                        additive_since_validation: 0,
                    })
                }
            };
            let source_ids = self.dependent_source_ids(&skill_id).await?;

            let mut last_checked: Option<DateTime<Utc>> = None;
            for sid in &source_ids {
                if let Some(ts) = self.max_watermark_checked_at(sid).await? {
                    last_checked = Some(last_checked.map_or(ts, |cur| cur.max(ts)));
                }
                if let Some(ts) = self.max_change_detected_at(sid).await? {
                    last_checked = Some(last_checked.map_or(ts, |cur| cur.max(ts)));
                }
            }

            let last_validated_at = self.max_validated_at(&skill_id).await?;

            let mut breaking = 0u64;
            let mut additive = 0u64;
            for sid in &source_ids {
                let since = last_validated_at.unwrap_or_else(|| DateTime::<Utc>::MIN_UTC);
                let (b, a) = self.change_counts_since(sid, since).await?;
                breaking += b;
                additive += a;
            }

            Ok(SkillFreshness {
                skill_name: skill_name.to_string(),
                last_checked,
                last_validated_at,
                breaking_since_validation: breaking,
                additive_since_validation: additive,
            })
        })
    }

    async fn dependent_source_ids(&self, skill_id: &str) -> Result<Vec<String>> {
        let mut result = self
            .db
            .query("SELECT source_id FROM skill_source_deps WHERE skill_id = $sid")
            .bind(("sid", skill_id.to_string()))
            .await?;
        #[derive(serde::Deserialize)]
        struct Row {
            source_id: String,
        }
        let rows: Vec<Row> = result.take(0)?;
        Ok(rows.into_iter().map(|r| r.source_id).collect())
    }

    async fn max_watermark_checked_at(&self, source_id: &str) -> Result<Option<DateTime<Utc>>> {
        let mut result = self
            .db
            .query(
                "SELECT checked_at FROM watermark_checks WHERE source_id = $sid ORDER BY checked_at DESC LIMIT 1",
            )
            .bind(("sid", source_id.to_string()))
            .await?;
        #[derive(serde::Deserialize)]
        struct Row {
            checked_at: DateTime<Utc>,
        }
        let rows: Vec<Row> = result.take(0)?;
        Ok(rows.into_iter().next().map(|r| r.checked_at))
    }

    async fn max_change_detected_at(&self, source_id: &str) -> Result<Option<DateTime<Utc>>> {
        let mut result = self
            .db
            .query(
                "SELECT detected_at FROM changes WHERE source_id = $sid ORDER BY detected_at DESC LIMIT 1",
            )
            .bind(("sid", source_id.to_string()))
            .await?;
        #[derive(serde::Deserialize)]
        struct Row {
            detected_at: DateTime<Utc>,
        }
        let rows: Vec<Row> = result.take(0)?;
        Ok(rows.into_iter().next().map(|r| r.detected_at))
    }

    async fn max_validated_at(&self, skill_id: &str) -> Result<Option<DateTime<Utc>>> {
        let mut result = self
            .db
            .query(
                "SELECT validated_at FROM validations WHERE skill_id = $sid ORDER BY validated_at DESC LIMIT 1",
            )
            .bind(("sid", skill_id.to_string()))
            .await?;
        #[derive(serde::Deserialize)]
        struct Row {
            validated_at: DateTime<Utc>,
        }
        let rows: Vec<Row> = result.take(0)?;
        Ok(rows.into_iter().next().map(|r| r.validated_at))
    }

    async fn change_counts_since(
        &self,
        source_id: &str,
        since: DateTime<Utc>,
    ) -> Result<(u64, u64)> {
        let mut result = self
            .db
            .query("SELECT classification FROM changes WHERE source_id = $sid AND detected_at > $since")
            .bind(("sid", source_id.to_string()))
            .bind(("since", since))
            .await?;
        #[derive(serde::Deserialize)]
        struct Row {
            classification: Classification,
        }
        let rows: Vec<Row> = result.take(0)?;
        let breaking = rows
            .iter()
            .filter(|r| r.classification == Classification::Breaking)
            .count() as u64;
        let additive = rows
            .iter()
            .filter(|r| r.classification == Classification::Additive)
            .count() as u64;
        Ok((breaking, additive))
    }

    /// `skill_budget` (§4.1, §4.4): aggregate the most recent
    /// `ContentMeasurement` per file against a per-filetype threshold.
    pub fn skill_budget(
        &self,
        skill_name: &str,
        thresholds: &HashMap<String, u64>,
    ) -> Result<SkillBudget> {
        self.rt.block_on(async {
            let skill_id = match self.find_skill_id(skill_name).await? {
                Some(id) => id,
                None => {
                    return Ok(SkillBudget {
                        skill_name: skill_name.to_string(),
                        by_filetype: HashMap::new(),
                        over_budget: false,
                    })
                }
            };

            let mut result = self
                .db
                .query("SELECT * FROM content_measurements WHERE skill_id = $sid")
                .bind(("sid", skill_id))
                .await?;
            let rows: Vec<ContentMeasurementRow> = result.take(0)?;

            let mut by_filetype: HashMap<String, FileTypeBudget> = HashMap::new();
            for row in rows {
                let filetype = std::path::Path::new(&row.file_path)
                    .extension()
                    .map(|e| e.to_string_lossy().to_string())
                    .unwrap_or_else(|| "unknown".to_string());
                let entry = by_filetype.entry(filetype.clone()).or_insert(FileTypeBudget {
                    line_count: 0,
                    estimated_tokens: 0,
                    threshold: thresholds.get(&filetype).copied(),
                    over_budget: false,
                });
                entry.line_count += row.line_count;
                entry.estimated_tokens += row.estimated_tokens;
            }

            let mut over_budget = false;
            for entry in by_filetype.values_mut() {
                if let Some(t) = entry.threshold {
                    entry.over_budget = entry.estimated_tokens > t;
                    over_budget = over_budget || entry.over_budget;
                }
            }

            Ok(SkillBudget {
                skill_name: skill_name.to_string(),
                by_filetype,
                over_budget,
            })
        })
    }

    /// `latest_source_check` (§4.1, §4.3 step 7): the most recent
    /// source-monitor summary session event for a git source.
    pub fn latest_source_check(&self, source_name: &str) -> Result<Option<SourceCheckSummary>> {
        self.rt.block_on(async {
            let mut result = self
                .db
                .query(
                    "SELECT * FROM session_events WHERE event_type = 'source_check_summary' AND target = $target ORDER BY created_at DESC LIMIT 1",
                )
                .bind(("target", source_name.to_string()))
                .await?;
            let rows: Vec<SessionEventRow> = result.take(0)?;
            let row = match rows.into_iter().next() {
                Some(r) => r,
                None => return Ok(None),
            };
            let meta = row.metadata;
            Ok(Some(SourceCheckSummary {
                source_name: source_name.to_string(),
                checked_at: row.created_at,
                commits_count: meta.get("commits_count").and_then(|v| v.as_u64()).unwrap_or(0),
                changed_files_count: meta
                    .get("changed_files_count")
                    .and_then(|v| v.as_u64())
                    .unwrap_or(0),
                watched_hits: meta.get("watched_hits").and_then(|v| v.as_u64()).unwrap_or(0),
                deprecations: meta
                    .get("deprecations")
                    .and_then(|v| v.as_array())
                    .map(|a| a.iter().filter_map(|x| x.as_str().map(String::from)).collect())
                    .unwrap_or_default(),
                top_commits: meta
                    .get("top_commits")
                    .and_then(|v| v.as_array())
                    .map(|a| a.iter().filter_map(|x| x.as_str().map(String::from)).collect())
                    .unwrap_or_default(),
                classification: meta
                    .get("classification")
                    .and_then(|v| v.as_str())
                    .unwrap_or("NONE")
                    .to_string(),
            }))
        })
    }

    // -----------------------------------------------------------------
    // Helpers for the Update Orchestrator
    // -----------------------------------------------------------------

    /// All `Change` rows detected after `since` for sources the skill
    /// depends on (§4.5 step 1, "collecting_changes").
    pub fn pending_changes_for_skill(
        &self,
        skill_name: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<ChangeRow>> {
        self.rt.block_on(async {
            let skill_id = match self.find_skill_id(skill_name).await? {
                Some(id) => id,
                None => return Ok(Vec::new()),
            };
            let source_ids = self.dependent_source_ids(&skill_id).await?;
            let mut out = Vec::new();
            for sid in source_ids {
                let mut result = self
                    .db
                    .query(
                        "SELECT * FROM changes WHERE source_id = $sid AND detected_at > $since ORDER BY detected_at",
                    )
                    .bind(("sid", sid))
                    .bind(("since", since))
                    .await?;
                let mut rows: Vec<ChangeRow> = result.take(0)?;
                out.append(&mut rows);
            }
            Ok(out)
        })
    }

    /// The timestamp of the skill's most recent `applied` `UpdateAttempt`,
    /// used as the "since last apply" watermark.
    pub fn last_applied_at(&self, skill_name: &str) -> Result<Option<DateTime<Utc>>> {
        self.rt.block_on(async {
            let skill_id = match self.find_skill_id(skill_name).await? {
                Some(id) => id,
                None => return Ok(None),
            };
            let mut result = self
                .db
                .query(
                    "SELECT created_at FROM update_attempts WHERE skill_id = $sid AND status = 'applied' ORDER BY created_at DESC LIMIT 1",
                )
                .bind(("sid", skill_id))
                .await?;
            #[derive(serde::Deserialize)]
            struct Row {
                created_at: DateTime<Utc>,
            }
            let rows: Vec<Row> = result.take(0)?;
            Ok(rows.into_iter().next().map(|r| r.created_at))
        })
    }

    /// Most recent `staged` `UpdateAttempt` for `(skill, mode)`, used by
    /// the orchestrator's gate to validate the invariant in §3.2 / §8.1
    /// property 3 before transitioning to `applied`.
    pub fn latest_staged_attempt(
        &self,
        skill_name: &str,
        mode: &str,
    ) -> Result<Option<UpdateAttemptRow>> {
        self.rt.block_on(async {
            let skill_id = match self.find_skill_id(skill_name).await? {
                Some(id) => id,
                None => return Ok(None),
            };
            let mut result = self
                .db
                .query(
                    "SELECT * FROM update_attempts WHERE skill_id = $sid AND mode = $mode AND status = 'staged' ORDER BY created_at DESC LIMIT 1",
                )
                .bind(("sid", skill_id))
                .bind(("mode", mode.to_string()))
                .await?;
            let rows: Vec<UpdateAttemptRow> = result.take(0)?;
            Ok(rows.into_iter().next())
        })
    }
}
