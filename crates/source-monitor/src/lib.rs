//! Git-based change-data-capture (§4.3): shallow clone, commit and
//! changed-file enumeration, AST-based public-API extraction, and
//! deprecation-keyword scanning, summarized into a single session event.

pub mod clone;
pub mod commits;
pub mod deprecation;
pub mod error;
pub mod extract;
pub mod files;
pub mod monitor;

pub use error::{Result, SourceMonitorError};
pub use monitor::{check_git_source, GitCheckReport, SourceClassification};
