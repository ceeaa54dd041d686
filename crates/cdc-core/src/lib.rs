//! Shared domain types and ambient-stack utilities used by every crate in
//! the workspace: configuration, error taxonomy, structured logging,
//! blocking subprocess execution, per-host rate limiting, the lexical
//! change classifier, and the pluggable public-API extraction interface.

pub mod classify;
pub mod config;
pub mod error;
pub mod extractor;
pub mod obs;
pub mod process;
pub mod rate_limit;
pub mod telemetry;

pub use classify::Classification;
pub use config::Config;
pub use error::{CdcError, Result};
pub use rate_limit::RateLimiter;
