//! Document source backed by a file shipped next to the binary.

use std::path::PathBuf;

use async_trait::async_trait;
use log::info;

use crate::fetch::{DocumentSource, FetchError};

pub struct BundleDocumentSource {
    path: PathBuf,
}

impl BundleDocumentSource {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

#[async_trait]
impl DocumentSource for BundleDocumentSource {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    async fn fetch(&self) -> Result<Vec<u8>, FetchError> {
        let bytes = tokio::fs::read(&self.path).await?;
        info!("Read document from {} ({} bytes)", self.path.display(), bytes.len());
        Ok(bytes)
    }
}
