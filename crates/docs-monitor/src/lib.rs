//! Three-layer change-data-capture for documentation bundles, HTTP or local
//! (§4.2): DETECT (conditional watermark check) → IDENTIFY (page split,
//! hash, content recovery) → CLASSIFY (lexical heuristic, `cdc_core::classify`).

pub mod bundle;
pub mod detect;
pub mod error;
pub mod identify;
pub mod monitor;

pub use error::{DocsMonitorError, Result};
pub use monitor::{check_docs_source, PageChangeReport, SourceCheckReport};
