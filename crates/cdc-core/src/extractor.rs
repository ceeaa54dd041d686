//! Pluggable public-API extraction interface (§9: "AST extraction is
//! deliberately restricted to one language in v1; an interface
//! `public_api_extractor(path) -> [signature]` should be defined so other
//! languages can be added without touching the Source Monitor").

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SymbolKind {
    Function,
    Type,
    Method,
}

/// A single public symbol extracted from a source file, rendered as a
/// human-readable signature line (§4.3 step 4).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature {
    pub kind: SymbolKind,
    pub name: String,
    pub line: String,
}

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("io error reading {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("parse error in {path}: {message}")]
    Parse { path: String, message: String },
}

/// Implemented once per supported language (§9). The Source Monitor holds a
/// `Vec<Box<dyn PublicApiExtractor>>` and dispatches by `supports`.
pub trait PublicApiExtractor: Send + Sync {
    /// Whether this extractor can parse the file at `path`, typically by
    /// extension.
    fn supports(&self, path: &Path) -> bool;

    /// Extract public symbols, excluding any whose name starts with `_`
    /// (§4.3 step 4).
    fn extract(&self, path: &Path) -> Result<Vec<Signature>, ExtractError>;
}
