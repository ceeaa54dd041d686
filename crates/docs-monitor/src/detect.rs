//! Layer 1 DETECT (§4.2): a cheap conditional check against the last
//! recorded Last-Modified/ETag watermark (or, for local files, mtime). 10s
//! timeout, no retries. A network/io error is conservative: it is reported
//! as "changed" so a flaky check never hides a real update, pushing the
//! decision down to IDENTIFY/CLASSIFY instead of silently skipping it.

use std::fs;
use std::time::{Duration, UNIX_EPOCH};

use cdc_core::RateLimiter;

use crate::error::{DocsMonitorError, Result};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Watermark {
    pub last_modified: Option<String>,
    pub etag: Option<String>,
}

pub trait BundleSource: Send + Sync {
    fn head(&self, url: &str) -> Result<Watermark>;
    fn get(&self, url: &str) -> Result<String>;
}

const DETECT_TIMEOUT: Duration = Duration::from_secs(10);
const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

pub struct HttpBundleSource {
    client: reqwest::blocking::Client,
    limiter: RateLimiter,
}

impl HttpBundleSource {
    pub fn new() -> Self {
        Self {
            client: reqwest::blocking::Client::new(),
            limiter: RateLimiter::default(),
        }
    }

    fn host_of(url: &str) -> String {
        url.split("://")
            .nth(1)
            .and_then(|rest| rest.split('/').next())
            .unwrap_or(url)
            .to_string()
    }
}

impl Default for HttpBundleSource {
    fn default() -> Self {
        Self::new()
    }
}

impl BundleSource for HttpBundleSource {
    fn head(&self, url: &str) -> Result<Watermark> {
        self.limiter.acquire(&Self::host_of(url));
        let resp = self
            .client
            .head(url)
            .timeout(DETECT_TIMEOUT)
            .send()
            .map_err(|e| DocsMonitorError::Http {
                url: url.to_string(),
                message: e.to_string(),
            })?;
        let headers = resp.headers();
        Ok(Watermark {
            last_modified: headers
                .get(reqwest::header::LAST_MODIFIED)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string),
            etag: headers
                .get(reqwest::header::ETAG)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string),
        })
    }

    fn get(&self, url: &str) -> Result<String> {
        self.limiter.acquire(&Self::host_of(url));
        let resp = self
            .client
            .get(url)
            .timeout(FETCH_TIMEOUT)
            .send()
            .map_err(|e| DocsMonitorError::Http {
                url: url.to_string(),
                message: e.to_string(),
            })?;
        resp.error_for_status()
            .map_err(|e| DocsMonitorError::Http {
                url: url.to_string(),
                message: e.to_string(),
            })?
            .text()
            .map_err(|e| DocsMonitorError::Http {
                url: url.to_string(),
                message: e.to_string(),
            })
    }
}

/// Local-file variant (§4.2): there is no conditional-request protocol for
/// a filesystem path, so DETECT substitutes the file's mtime for the
/// Last-Modified header.
pub struct LocalBundleSource;

impl BundleSource for LocalBundleSource {
    fn head(&self, path: &str) -> Result<Watermark> {
        let meta = fs::metadata(path).map_err(|source| DocsMonitorError::Io {
            path: path.to_string(),
            source,
        })?;
        let modified = meta
            .modified()
            .ok()
            .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
            .map(|d| d.as_nanos().to_string());
        Ok(Watermark {
            last_modified: modified,
            etag: None,
        })
    }

    fn get(&self, path: &str) -> Result<String> {
        fs::read_to_string(path).map_err(|source| DocsMonitorError::Io {
            path: path.to_string(),
            source,
        })
    }
}

/// `bundle_url` values without an `http(s)://` scheme are local paths
/// (§4.2's local-file variant; §6.1 has no separate `file` source type).
pub fn is_local_path(bundle_url: &str) -> bool {
    !(bundle_url.starts_with("http://") || bundle_url.starts_with("https://"))
}

/// Compare a freshly observed watermark against the previously stored one.
/// No prior watermark (first-ever check) always reports changed.
pub fn detect(source: &dyn BundleSource, url: &str, previous: Option<&Watermark>) -> (bool, Watermark) {
    match source.head(url) {
        Ok(wm) => {
            let no_validators = wm.last_modified.is_none() && wm.etag.is_none();
            let changed = match previous {
                None => true,
                Some(_) if no_validators => true,
                Some(prev) => *prev != wm,
            };
            (changed, wm)
        }
        Err(_) => (true, Watermark::default()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FakeSource {
        watermark: Watermark,
    }

    impl BundleSource for FakeSource {
        fn head(&self, _url: &str) -> Result<Watermark> {
            Ok(self.watermark.clone())
        }
        fn get(&self, _url: &str) -> Result<String> {
            Ok(String::new())
        }
    }

    #[test]
    fn first_check_is_always_changed() {
        let src = FakeSource {
            watermark: Watermark {
                last_modified: Some("x".into()),
                etag: None,
            },
        };
        let (changed, _) = detect(&src, "u", None);
        assert!(changed);
    }

    #[test]
    fn identical_watermark_is_unchanged() {
        let wm = Watermark {
            last_modified: Some("x".into()),
            etag: Some("e".into()),
        };
        let src = FakeSource { watermark: wm.clone() };
        let (changed, _) = detect(&src, "u", Some(&wm));
        assert!(!changed);
    }

    #[test]
    fn differing_etag_is_changed() {
        let prev = Watermark {
            last_modified: Some("x".into()),
            etag: Some("e1".into()),
        };
        let now = Watermark {
            last_modified: Some("x".into()),
            etag: Some("e2".into()),
        };
        let src = FakeSource { watermark: now };
        let (changed, _) = detect(&src, "u", Some(&prev));
        assert!(changed);
    }

    #[test]
    fn absent_validators_are_always_changed() {
        let wm = Watermark {
            last_modified: None,
            etag: None,
        };
        let src = FakeSource { watermark: wm.clone() };
        let (changed, _) = detect(&src, "u", Some(&wm));
        assert!(changed);
    }

    #[test]
    fn local_path_detection() {
        assert!(is_local_path("/etc/hosts"));
        assert!(!is_local_path("https://example.com/x"));
    }
}
