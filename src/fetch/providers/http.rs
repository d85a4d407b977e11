//! Document source that GETs the application document over HTTP(S).

use async_trait::async_trait;
use log::{debug, info, warn};
use reqwest::Url;

use crate::fetch::{DocumentSource, FetchError};

pub struct HttpDocumentSource {
    url: Url,
    client: reqwest::Client,
}

impl HttpDocumentSource {
    pub fn new(url: Url, client: reqwest::Client) -> Self {
        Self { url, client }
    }
}

/// Sends a GET and returns the response if its status is a success.
/// Shared with the download retriever.
pub(crate) async fn get(
    client: &reqwest::Client,
    url: &Url,
) -> Result<reqwest::Response, FetchError> {
    let response = client
        .get(url.clone())
        .send()
        .await
        .map_err(|e| FetchError::Network(e.to_string()))?;

    debug!("GET {} -> {}", url, response.status());

    if !response.status().is_success() {
        let status = response.status().as_u16();
        let message = response
            .text()
            .await
            .unwrap_or_else(|_| "unknown error".to_string());
        warn!("GET {} failed: {} - {}", url, status, message);
        return Err(FetchError::Http { status, message });
    }

    Ok(response)
}

#[async_trait]
impl DocumentSource for HttpDocumentSource {
    fn describe(&self) -> String {
        self.url.to_string()
    }

    async fn fetch(&self) -> Result<Vec<u8>, FetchError> {
        let response = get(&self.client, &self.url).await?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?;
        info!("Fetched document from {} ({} bytes)", self.url, bytes.len());
        Ok(bytes.to_vec())
    }
}
