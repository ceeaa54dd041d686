//! Orchestrates DETECT → IDENTIFY → CLASSIFY → persistence for a single
//! configured `docs` source (§4.2, §4.3 steps 1-5).

use chrono::Utc;

use cdc_core::classify::Classification;
use cdc_core::config::{Source, SourceKind};
use cdc_core::obs;
use cdc_store::Store;

use crate::detect::{self, BundleSource, HttpBundleSource, LocalBundleSource, Watermark};
use crate::error::Result;
use crate::identify::{self, PageIdentity};

pub struct PageChangeReport {
    pub url: String,
    pub classification: Classification,
    pub new_hash: String,
}

pub struct SourceCheckReport {
    pub source: String,
    pub watermark_changed: bool,
    pub changes: Vec<PageChangeReport>,
}

/// Run the full three-layer check for one `docs` source and persist every
/// fact row it produces. A `git` source is a no-op here; it belongs to the
/// source monitor.
pub fn check_docs_source(store: &Store, source: &Source) -> Result<SourceCheckReport> {
    let (bundle_url, watched_pages, page_delimiter) = match &source.kind {
        SourceKind::Docs {
            bundle_url,
            pages,
            page_delimiter,
        } => (bundle_url.clone(), pages.clone(), page_delimiter.clone()),
        SourceKind::Git { .. } => {
            return Ok(SourceCheckReport {
                source: source.name.clone(),
                watermark_changed: false,
                changes: Vec::new(),
            })
        }
    };

    let previous = store.latest_watermark(&source.name)?.map(|row| Watermark {
        last_modified: row.last_modified,
        etag: row.etag,
    });

    let identities = if detect::is_local_path(&bundle_url) {
        let local = LocalBundleSource;
        run_layer(store, source, &local, &bundle_url, previous.as_ref(), |content| {
            identify::identify_single_page(store, &source.name, &bundle_url, content)
        })?
    } else {
        let http = HttpBundleSource::new();
        run_layer(store, source, &http, &bundle_url, previous.as_ref(), |content| {
            identify::identify_pages(store, &source.name, content, &page_delimiter, &watched_pages)
        })?
    };

    let identities = match identities {
        Some(identities) => identities,
        None => {
            return Ok(SourceCheckReport {
                source: source.name.clone(),
                watermark_changed: false,
                changes: Vec::new(),
            })
        }
    };

    let mut changes = Vec::new();
    for identity in &identities {
        if identity.old_hash == identity.new_hash {
            continue;
        }
        let classification = identify::classify(identity);
        let summary = summarize(identity, classification);
        store.record_change(
            &source.name,
            &identity.url,
            Utc::now(),
            classification,
            &identity.old_hash,
            &identity.new_hash,
            &summary,
        )?;
        store.cas_put(&identity.new_hash, &identity.new_content)?;
        obs::emit_change_detected(&source.name, &identity.url, classification.as_str());
        changes.push(PageChangeReport {
            url: identity.url.clone(),
            classification,
            new_hash: identity.new_hash.clone(),
        });
    }

    Ok(SourceCheckReport {
        source: source.name.clone(),
        watermark_changed: true,
        changes,
    })
}

/// DETECT then, if changed, fetch + IDENTIFY. Records the watermark check
/// fact row either way, and reports `None` when DETECT found nothing new.
fn run_layer(
    store: &Store,
    source: &Source,
    bundle_source: &dyn BundleSource,
    bundle_url: &str,
    previous: Option<&Watermark>,
    identify: impl FnOnce(&str) -> Result<Vec<PageIdentity>>,
) -> Result<Option<Vec<PageIdentity>>> {
    let (changed, watermark) = detect::detect(bundle_source, bundle_url, previous);
    let checked_at = Utc::now();
    store.record_watermark_check(
        &source.name,
        checked_at,
        watermark.last_modified.clone(),
        watermark.etag.clone(),
        changed,
    )?;
    obs::emit_watermark_check(&source.name, changed);

    if !changed {
        return Ok(None);
    }
    let content = bundle_source.get(bundle_url)?;
    Ok(Some(identify(&content)?))
}

fn summarize(identity: &PageIdentity, classification: Classification) -> String {
    format!(
        "{classification} change on {} ({} -> {})",
        identity.url,
        short(&identity.old_hash),
        short(&identity.new_hash)
    )
}

fn short(hash: &str) -> &str {
    if hash.len() >= 8 {
        &hash[..8]
    } else {
        hash
    }
}
