//! Latest-hash / latest-watermark queries (§4.4): direct reads from the
//! corresponding views, with no freshness-style error suppression.

use chrono::{DateTime, Utc};

use cdc_store::{Store, WatermarkCheckRow};

use crate::Result;

pub fn latest_watermark(store: &Store, source_name: &str) -> Result<Option<WatermarkCheckRow>> {
    store.latest_watermark(source_name)
}

pub fn latest_page_hash(
    store: &Store,
    source_name: &str,
    page_url: &str,
) -> Result<Option<(String, DateTime<Utc>)>> {
    store.latest_page_hash(source_name, page_url)
}
