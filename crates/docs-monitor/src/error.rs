use thiserror::Error;

#[derive(Debug, Error)]
pub enum DocsMonitorError {
    #[error("http request to {url} failed: {message}")]
    Http { url: String, message: String },

    #[error("io error reading local file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Store(#[from] cdc_store::StoreError),
}

pub type Result<T> = std::result::Result<T, DocsMonitorError>;
