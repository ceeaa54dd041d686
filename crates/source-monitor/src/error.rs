use thiserror::Error;

#[derive(Debug, Error)]
pub enum SourceMonitorError {
    #[error("shallow clone of {repo_url} failed: {message}")]
    CloneFailed { repo_url: String, message: String },

    #[error(transparent)]
    Process(#[from] cdc_core::CdcError),

    #[error(transparent)]
    Store(#[from] cdc_store::StoreError),
}

pub type Result<T> = std::result::Result<T, SourceMonitorError>;
