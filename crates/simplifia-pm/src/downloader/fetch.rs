//! Streaming artifact downloads.

use std::fs::File;
use std::io::{BufWriter, ErrorKind, Read, Write};
use std::path::Path;
use std::time::Duration;

use crate::error::FetchError;
use crate::http::{HttpClient, HttpClientConfig, HttpError};

const CHUNK_SIZE: usize = 64 * 1024;

/// Downloads an artifact to a local path.
///
/// Implementations create `dest` and leave it behind on failure; the
/// staging area owns cleanup.
pub trait ArtifactFetcher {
    /// Stream `url` into `dest`, returning the number of bytes written.
    ///
    /// `progress` receives `(downloaded, total)`; `total` is 0 when the
    /// server does not announce a length.
    fn download(
        &self,
        url: &str,
        dest: &Path,
        timeout: Duration,
        progress: &dyn Fn(u64, u64),
    ) -> Result<u64, FetchError>;
}

/// HTTP(S) downloader with an optional size ceiling.
///
/// The download timeout is an idle limit: it bounds the wait for response
/// headers and for each chunk of the body, not the length of the transfer.
pub struct HttpFetcher {
    config: HttpClientConfig,
    max_bytes: Option<u64>,
}

impl HttpFetcher {
    pub fn new(config: HttpClientConfig) -> Self {
        Self { config, max_bytes: None }
    }

    pub fn with_max_bytes(mut self, max_bytes: Option<u64>) -> Self {
        self.max_bytes = max_bytes;
        self
    }

    fn request_error(error: HttpError, url: &str) -> FetchError {
        match error {
            HttpError::Timeout { .. } => FetchError::Timeout { url: url.to_string() },
            HttpError::HttpStatus { status, .. } => FetchError::HttpStatus {
                status,
                url: url.to_string(),
            },
            HttpError::Io(e) => FetchError::Io(e),
            other => FetchError::Network {
                url: url.to_string(),
                message: other.to_string(),
            },
        }
    }

    fn read_error(error: std::io::Error, url: &str) -> FetchError {
        let timed_out = error.kind() == ErrorKind::TimedOut
            || error
                .get_ref()
                .and_then(|inner| inner.downcast_ref::<reqwest::Error>())
                .is_some_and(|e| e.is_timeout());

        if timed_out {
            FetchError::Timeout { url: url.to_string() }
        } else {
            FetchError::Network {
                url: url.to_string(),
                message: error.to_string(),
            }
        }
    }

    fn too_large(&self, size: u64, url: &str) -> Option<FetchError> {
        match self.max_bytes {
            Some(limit) if size > limit => Some(FetchError::TooLarge {
                url: url.to_string(),
                limit,
            }),
            _ => None,
        }
    }
}

impl ArtifactFetcher for HttpFetcher {
    fn download(
        &self,
        url: &str,
        dest: &Path,
        timeout: Duration,
        progress: &dyn Fn(u64, u64),
    ) -> Result<u64, FetchError> {
        let http = HttpClient::with_config(self.config.clone().with_timeout(timeout)).map_err(|e| {
            FetchError::Network {
                url: url.to_string(),
                message: e.to_string(),
            }
        })?;
        let mut response = http.get(url, None).map_err(|e| Self::request_error(e, url))?;

        let total_size = response.content_length().unwrap_or(0);
        if let Some(err) = self.too_large(total_size, url) {
            return Err(err);
        }

        if let Some(parent) = dest.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let mut writer = BufWriter::new(File::create(dest)?);
        let mut buffer = vec![0u8; CHUNK_SIZE];
        let mut downloaded: u64 = 0;

        loop {
            let read = match response.read(&mut buffer) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(Self::read_error(e, url)),
            };

            downloaded += read as u64;
            if let Some(err) = self.too_large(downloaded, url) {
                return Err(err);
            }

            writer.write_all(&buffer[..read])?;
            progress(downloaded, total_size);
        }

        writer.flush()?;
        log::info!("Downloaded {} bytes from {}", downloaded, url);

        Ok(downloaded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_error_mapping() {
        let url = "https://example.com/p.zip";

        let err = HttpFetcher::request_error(HttpError::Timeout { url: url.to_string() }, url);
        assert!(matches!(err, FetchError::Timeout { .. }));

        let err = HttpFetcher::request_error(
            HttpError::HttpStatus {
                status: 404,
                url: url.to_string(),
            },
            url,
        );
        assert!(matches!(err, FetchError::HttpStatus { status: 404, .. }));

        let err = HttpFetcher::request_error(HttpError::JsonParse("x".to_string()), url);
        assert!(matches!(err, FetchError::Network { .. }));
    }

    #[test]
    fn test_read_error_timeout_kind() {
        let err = HttpFetcher::read_error(std::io::Error::new(ErrorKind::TimedOut, "slow"), "u");
        assert!(matches!(err, FetchError::Timeout { .. }));

        let err = HttpFetcher::read_error(std::io::Error::new(ErrorKind::ConnectionReset, "reset"), "u");
        assert!(matches!(err, FetchError::Network { .. }));
    }

    #[test]
    fn test_size_limit() {
        let fetcher = HttpFetcher::new(HttpClientConfig::default()).with_max_bytes(Some(10));
        assert!(fetcher.too_large(10, "u").is_none());
        assert!(matches!(fetcher.too_large(11, "u"), Some(FetchError::TooLarge { limit: 10, .. })));

        let unbounded = HttpFetcher::new(HttpClientConfig::default());
        assert!(unbounded.too_large(u64::MAX, "u").is_none());
    }

    #[test]
    #[ignore] // Requires network access
    fn test_download_file() {
        use tempfile::TempDir;

        let fetcher = HttpFetcher::new(HttpClientConfig::default());
        let temp_dir = TempDir::new().unwrap();
        let dest = temp_dir.path().join("test.bin");

        let written = fetcher
            .download("https://httpbin.org/bytes/100", &dest, Duration::from_secs(60), &|_, _| {})
            .unwrap();

        assert_eq!(written, 100);
        assert!(dest.exists());
    }
}
