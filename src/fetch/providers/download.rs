//! File retriever that downloads (or copies) into a local directory.
//!
//! Every retrieval writes to its own uuid-named `.part` file and renames it
//! over the final path once complete, so overlapping retrievals of the same
//! url never interleave bytes. The final name is the url's last path segment;
//! a stale file with that name is replaced.

use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use futures::StreamExt;
use log::{debug, info};
use percent_encoding::percent_decode_str;
use reqwest::Url;
use tokio::io::AsyncWriteExt;

use super::http::get;
use crate::fetch::{FetchError, FileRetriever};

pub struct DownloadRetriever {
    client: reqwest::Client,
    download_dir: PathBuf,
}

impl DownloadRetriever {
    pub fn new(client: reqwest::Client, download_dir: PathBuf) -> Self {
        Self {
            client,
            download_dir,
        }
    }

    /// Where a retrieval of `url` ends up.
    pub fn destination_for(&self, url: &Url) -> PathBuf {
        self.download_dir.join(file_name_for(url))
    }

    async fn download(&self, url: &Url, part: &Path) -> Result<(), FetchError> {
        let response = get(&self.client, url).await?;
        let mut file = tokio::fs::File::create(part).await?;
        let mut stream = response.bytes_stream();
        let mut written = 0usize;

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| FetchError::Network(e.to_string()))?;
            file.write_all(&chunk).await?;
            written += chunk.len();
        }
        file.flush().await?;

        debug!("Downloaded {} bytes from {}", written, url);
        Ok(())
    }

    async fn copy_local(&self, url: &Url, part: &Path) -> Result<(), FetchError> {
        let source = url
            .to_file_path()
            .map_err(|_| FetchError::Config(format!("not a local file url: {url}")))?;
        let copied = tokio::fs::copy(&source, part).await?;
        debug!("Copied {} bytes from {}", copied, source.display());
        Ok(())
    }
}

/// Last non-empty path segment, falling back to the host, then "download".
///
/// The segment is percent-decoded; separators that decoding brings back are
/// replaced so the name stays inside the download directory.
fn file_name_for(url: &Url) -> String {
    let name = match url
        .path_segments()
        .and_then(|mut segments| segments.rfind(|s| !s.is_empty()))
    {
        Some(segment) => percent_decode_str(segment)
            .decode_utf8_lossy()
            .replace(['/', '\\'], "_"),
        None => url.host_str().unwrap_or_default().to_string(),
    };
    match name.as_str() {
        "" | "." | ".." => "download".to_string(),
        _ => name,
    }
}

/// Moves `part` over `target`, replacing whatever is there.
async fn replace(part: &Path, target: &Path) -> io::Result<()> {
    if tokio::fs::rename(part, target).await.is_ok() {
        return Ok(());
    }
    // Some platforms refuse to rename onto an existing file.
    match tokio::fs::remove_file(target).await {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => return Err(e),
    }
    tokio::fs::rename(part, target).await
}

#[async_trait]
impl FileRetriever for DownloadRetriever {
    async fn retrieve(&self, url: &Url) -> Result<PathBuf, FetchError> {
        let scheme = url.scheme();
        if !matches!(scheme, "http" | "https" | "file") {
            return Err(FetchError::UnsupportedScheme(scheme.to_string()));
        }

        tokio::fs::create_dir_all(&self.download_dir).await?;
        let target = self.destination_for(url);
        // Named by the uuid alone so a long final name still fits.
        let part = self
            .download_dir
            .join(format!(".{}.part", uuid::Uuid::new_v4()));

        let fetched = if scheme == "file" {
            self.copy_local(url, &part).await
        } else {
            self.download(url, &part).await
        };
        if let Err(e) = fetched {
            let _ = tokio::fs::remove_file(&part).await;
            return Err(e);
        }

        if let Err(e) = replace(&part, &target).await {
            let _ = tokio::fs::remove_file(&part).await;
            return Err(FetchError::Io(e));
        }
        info!("Retrieved {} to {}", url, target.display());
        Ok(target)
    }
}
