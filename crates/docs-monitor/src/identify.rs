//! Layer 2 IDENTIFY (§4.2): split the fetched bundle into pages, normalize
//! and hash each one, and recover its previously stored content from the
//! CAS cache so CLASSIFY can re-diff across separate process runs.

use cdc_core::classify::{self, Classification};
use cdc_store::Store;

use crate::bundle::{self, Page};
use crate::error::Result;

pub struct PageIdentity {
    pub url: String,
    pub old_hash: String,
    pub old_content: String,
    pub new_hash: String,
    pub new_content: String,
}

/// Split `bundle_text` on `delimiter` and identify every page, filtering to
/// `watched_pages` when non-empty (§6.1 `pages`: empty watches every page
/// the bundle contains).
pub fn identify_pages(
    store: &Store,
    source_name: &str,
    bundle_text: &str,
    delimiter: &str,
    watched_pages: &[String],
) -> Result<Vec<PageIdentity>> {
    let pages = bundle::split_pages(bundle_text, delimiter);
    identify_from_pages(store, source_name, pages, watched_pages)
}

/// Local-file variant (§4.2): the whole file is one page, keyed by its own
/// path, with no delimiter splitting.
pub fn identify_single_page(
    store: &Store,
    source_name: &str,
    url: &str,
    content: &str,
) -> Result<Vec<PageIdentity>> {
    identify_from_pages(
        store,
        source_name,
        vec![Page {
            url: url.to_string(),
            content: content.to_string(),
        }],
        &[],
    )
}

fn identify_from_pages(
    store: &Store,
    source_name: &str,
    pages: Vec<Page>,
    watched_pages: &[String],
) -> Result<Vec<PageIdentity>> {
    let mut out = Vec::with_capacity(pages.len());
    for page in pages {
        if !watched_pages.is_empty() && !watched_pages.contains(&page.url) {
            continue;
        }

        let normalized = bundle::normalize(&page.content);
        let new_hash = bundle::sha256_hex(normalized.as_bytes());

        let old_hash = store
            .latest_page_hash(source_name, &page.url)?
            .map(|(hash, _)| hash)
            .unwrap_or_default();
        let old_content = store.cas_get(&old_hash)?.unwrap_or_default();

        out.push(PageIdentity {
            url: page.url,
            old_hash,
            old_content,
            new_hash,
            new_content: normalized,
        });
    }
    Ok(out)
}

pub fn classify(identity: &PageIdentity) -> Classification {
    classify::classify_diff(&identity.old_content, &identity.new_content)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn watched_pages_filter_drops_unlisted_urls() {
        let store = Store::open_in_memory().unwrap();
        let pages = vec![
            Page {
                url: "https://x/keep".into(),
                content: "a".into(),
            },
            Page {
                url: "https://x/drop".into(),
                content: "b".into(),
            },
        ];
        let watched = vec!["https://x/keep".to_string()];
        let out = identify_from_pages(&store, "src", pages, &watched).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].url, "https://x/keep");
    }

    #[test]
    fn empty_watch_list_keeps_every_page() {
        let store = Store::open_in_memory().unwrap();
        let pages = vec![Page {
            url: "https://x/a".into(),
            content: "a".into(),
        }];
        let out = identify_from_pages(&store, "src", pages, &[]).unwrap();
        assert_eq!(out.len(), 1);
    }
}
