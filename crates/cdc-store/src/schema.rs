//! Row shapes for the star schema (§3.1): six dimensions, six facts. Every
//! row carries a SurrealDB `id` (the surrogate key, assigned by the engine)
//! plus its natural key. Dimensions are overwritten in place (SCD-Type-1);
//! facts are append-only and are never the target of an `UPDATE`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use cdc_core::classify::Classification;

fn page_natural_id(url: &str) -> String {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(url.as_bytes());
    hex::encode(hasher.finalize())
}

// ---------------------------------------------------------------------------
// Dimensions (SCD-Type-1)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceRow {
    pub id: Option<surrealdb::sql::Thing>,
    pub name: String,
    pub kind: String,
    pub url: String,
    pub config: serde_json::Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillRow {
    pub id: Option<surrealdb::sql::Thing>,
    pub name: String,
    pub path: String,
    pub auto_update: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageRow {
    pub id: Option<surrealdb::sql::Thing>,
    pub natural_id: String,
    pub source_id: String,
    pub url: String,
    pub first_seen_at: DateTime<Utc>,
}

impl PageRow {
    pub fn natural_id_for(url: &str) -> String {
        page_natural_id(url)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillSourceDepRow {
    pub id: Option<surrealdb::sql::Thing>,
    pub skill_id: String,
    pub source_id: String,
}

/// Content-addressed cache of the most recently seen normalized body for
/// each page hash, grounded on the teacher's `CasStore` contract
/// (`oxidized-state::storage_traits::CasStore`). Not part of the star
/// schema's facts or dimensions: it exists only so the Docs Monitor can
/// recover `old_content` for the classifier on a later run, since `Change`
/// rows persist hashes, not bodies (§4.2 Layer 2/3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageBodyRow {
    pub id: Option<surrealdb::sql::Thing>,
    pub digest: String,
    pub content: String,
}

// ---------------------------------------------------------------------------
// Facts (append-only)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatermarkCheckRow {
    pub id: Option<surrealdb::sql::Thing>,
    pub source_id: String,
    pub checked_at: DateTime<Utc>,
    pub last_modified: Option<String>,
    pub etag: Option<String>,
    pub changed: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeRow {
    pub id: Option<surrealdb::sql::Thing>,
    pub source_id: String,
    pub page_id: String,
    pub detected_at: DateTime<Utc>,
    pub classification: Classification,
    pub old_hash: String,
    pub new_hash: String,
    pub summary: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationRow {
    pub id: Option<surrealdb::sql::Thing>,
    pub skill_id: String,
    pub validated_at: DateTime<Utc>,
    pub is_valid: bool,
    pub error_count: u32,
    pub warning_count: u32,
    pub error_detail: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateStatus {
    Staged,
    Applied,
    RolledBack,
    Failed,
}

impl UpdateStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            UpdateStatus::Staged => "staged",
            UpdateStatus::Applied => "applied",
            UpdateStatus::RolledBack => "rolled_back",
            UpdateStatus::Failed => "failed",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateAttemptRow {
    pub id: Option<surrealdb::sql::Thing>,
    pub skill_id: String,
    pub mode: String,
    pub status: UpdateStatus,
    pub backup_path: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentMeasurementRow {
    pub id: Option<surrealdb::sql::Thing>,
    pub skill_id: String,
    pub file_path: String,
    pub line_count: u64,
    pub estimated_tokens: u64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionEventRow {
    pub id: Option<surrealdb::sql::Thing>,
    pub session_id: String,
    pub event_type: String,
    pub target: String,
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
}
