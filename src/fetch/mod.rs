//! # Fetching
//!
//! Everything that produces bytes from somewhere else: the application
//! document at startup, and files that need to be local before preview.
//!
//! The core only sees the [`DocumentSource`] and [`FileRetriever`] traits.

pub mod provider;
pub mod providers;

use std::time::Duration;

pub use provider::{DocumentSource, FetchError, FileRetriever};
pub use providers::{BundleDocumentSource, DownloadRetriever, HttpDocumentSource};

use reqwest::Url;

/// Settings shared by every HTTP client the fetch layer builds.
#[derive(Debug, Clone)]
pub struct HttpSettings {
    pub timeout: Duration,
    pub user_agent: String,
}

/// Builds a reqwest client with the configured timeout and user agent.
pub fn build_client(settings: &HttpSettings) -> Result<reqwest::Client, FetchError> {
    reqwest::Client::builder()
        .timeout(settings.timeout)
        .user_agent(settings.user_agent.clone())
        .build()
        .map_err(|e| FetchError::Config(format!("HTTP client: {e}")))
}

/// Picks a source for `location`: `http(s)://` goes over the network,
/// `file://` and anything that isn't a url is read from disk.
pub fn document_source(
    location: &str,
    settings: &HttpSettings,
) -> Result<Box<dyn DocumentSource>, FetchError> {
    match Url::parse(location) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => {
            Ok(Box::new(HttpDocumentSource::new(url, build_client(settings)?)))
        }
        Ok(url) if url.scheme() == "file" => {
            let path = url
                .to_file_path()
                .map_err(|_| FetchError::Config(format!("not a local file url: {url}")))?;
            Ok(Box::new(BundleDocumentSource::new(path)))
        }
        // Windows drive letters parse as a one-letter scheme.
        Ok(url) if url.scheme().len() > 1 => {
            Err(FetchError::UnsupportedScheme(url.scheme().to_string()))
        }
        _ => Ok(Box::new(BundleDocumentSource::new(location.into()))),
    }
}
