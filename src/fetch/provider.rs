use std::fmt;
use std::path::PathBuf;

use async_trait::async_trait;
use reqwest::Url;

/// Errors that can occur while fetching documents or files.
/// Variants carry enough info to tell transient failures from setup mistakes.
#[derive(Debug)]
pub enum FetchError {
    /// Source misconfigured (bad location, client could not be built). Not retryable.
    Config(String),
    /// Network-level failure (timeout, DNS, connection refused). Retryable.
    Network(String),
    /// Server answered with a non-success status.
    Http { status: u16, message: String },
    /// Local file system failure while reading or writing.
    Io(std::io::Error),
    /// The url scheme is neither http(s) nor file.
    UnsupportedScheme(String),
}

impl FetchError {
    /// Whether trying again later might succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            FetchError::Network(_) => true,
            FetchError::Http { status, .. } => *status >= 500 || *status == 429,
            FetchError::Config(_) | FetchError::Io(_) | FetchError::UnsupportedScheme(_) => false,
        }
    }
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchError::Config(msg) => write!(f, "config error: {msg}"),
            FetchError::Network(msg) => write!(f, "network error: {msg}"),
            FetchError::Http { status, message } => write!(f, "HTTP {status}: {message}"),
            FetchError::Io(e) => write!(f, "I/O error: {e}"),
            FetchError::UnsupportedScheme(scheme) => write!(f, "unsupported url scheme: {scheme}"),
        }
    }
}

impl std::error::Error for FetchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FetchError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for FetchError {
    fn from(e: std::io::Error) -> Self {
        FetchError::Io(e)
    }
}

/// Produces the raw bytes of the application document.
#[async_trait]
pub trait DocumentSource: Send + Sync {
    /// Human-readable location, for logs and diagnostics.
    fn describe(&self) -> String;

    async fn fetch(&self) -> Result<Vec<u8>, FetchError>;
}

/// Makes a (possibly remote) resource available as a local, readable file.
#[async_trait]
pub trait FileRetriever: Send + Sync {
    async fn retrieve(&self, url: &Url) -> Result<PathBuf, FetchError>;
}
