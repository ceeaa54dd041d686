//! Read-side query layer (§4.4): freshness, budget, and latest-hash/
//! watermark views over the store's fact tables. Freshness uniquely
//! guarantees it never blocks and never fails — see `freshness`.

pub mod budget;
pub mod freshness;
pub mod latest;

pub type Result<T> = cdc_store::Result<T>;

pub use budget::skill_budget;
pub use freshness::{freshness, FreshnessReport, SourceStatus};
pub use latest::{latest_page_hash, latest_watermark};
