//! Test utilities shared across the crate.
//!
//! This module is only compiled during tests (`#[cfg(test)]`).

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use reqwest::Url;
use tokio::sync::Semaphore;

use crate::core::engine::NavigationEngine;
use crate::core::port::{PresentationPort, ShareItem};
use crate::core::registry::ScreenRegistry;
use crate::core::screen::{Application, Screen};
use crate::fetch::{FetchError, FileRetriever};

/// One call made on a [`RecordingPort`].
#[derive(Debug, Clone, PartialEq)]
pub enum PortCall {
    PushScreen(String),
    Alert { title: String, message: String },
    ExternalBrowser(Url),
    ShareSheet(Vec<ShareItem>),
    MediaPlayer(Url),
    Preview { path: PathBuf, name: Option<String> },
    PlaceCall(String),
    PreviewUnavailable(String),
}

/// A port that writes down every call instead of presenting anything.
#[derive(Default)]
pub struct RecordingPort {
    calls: Mutex<Vec<PortCall>>,
    last_engine: Mutex<Option<Arc<NavigationEngine>>>,
    open_urls: AtomicBool,
}

impl RecordingPort {
    pub fn calls(&self) -> Vec<PortCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Engine handed over by the most recent `push_screen`.
    pub fn last_engine(&self) -> Option<Arc<NavigationEngine>> {
        self.last_engine.lock().unwrap().clone()
    }

    /// Controls the answer to `can_open_url`. Defaults to `false`.
    pub fn allow_urls(&self, allow: bool) {
        self.open_urls.store(allow, Ordering::SeqCst);
    }

    fn record(&self, call: PortCall) {
        self.calls.lock().unwrap().push(call);
    }
}

impl PresentationPort for RecordingPort {
    fn push_screen(&self, screen: Arc<Screen>, engine: Arc<NavigationEngine>) {
        *self.last_engine.lock().unwrap() = Some(engine);
        self.record(PortCall::PushScreen(screen.id.clone()));
    }

    fn present_alert(&self, title: &str, message: &str) {
        self.record(PortCall::Alert {
            title: title.to_string(),
            message: message.to_string(),
        });
    }

    fn present_external_browser(&self, url: &Url) {
        self.record(PortCall::ExternalBrowser(url.clone()));
    }

    fn present_share_sheet(&self, items: &[ShareItem]) {
        self.record(PortCall::ShareSheet(items.to_vec()));
    }

    fn present_media_player(&self, url: &Url) {
        self.record(PortCall::MediaPlayer(url.clone()));
    }

    fn push_preview(&self, local_path: &Path, name: Option<&str>) {
        self.record(PortCall::Preview {
            path: local_path.to_path_buf(),
            name: name.map(str::to_string),
        });
    }

    fn can_open_url(&self, _url: &Url) -> bool {
        self.open_urls.load(Ordering::SeqCst)
    }

    fn place_call(&self, phone: &str) {
        self.record(PortCall::PlaceCall(phone.to_string()));
    }

    fn report_preview_unavailable(&self, reason: &str) {
        self.record(PortCall::PreviewUnavailable(reason.to_string()));
    }
}

/// A retriever that never touches the network.
pub struct StubRetriever {
    outcome: Option<PathBuf>,
    gate: Option<Arc<Semaphore>>,
}

impl StubRetriever {
    pub fn returning(path: &str) -> Self {
        Self {
            outcome: Some(PathBuf::from(path)),
            gate: None,
        }
    }

    pub fn failing() -> Self {
        Self {
            outcome: None,
            gate: None,
        }
    }

    /// Each retrieval waits for one permit on the returned semaphore.
    pub fn gated(path: &str) -> (Self, Arc<Semaphore>) {
        let gate = Arc::new(Semaphore::new(0));
        let retriever = Self {
            outcome: Some(PathBuf::from(path)),
            gate: Some(Arc::clone(&gate)),
        };
        (retriever, gate)
    }
}

#[async_trait]
impl FileRetriever for StubRetriever {
    async fn retrieve(&self, _url: &Url) -> Result<PathBuf, FetchError> {
        if let Some(gate) = &self.gate {
            gate.acquire()
                .await
                .map_err(|e| FetchError::Network(e.to_string()))?
                .forget();
        }
        self.outcome
            .clone()
            .ok_or_else(|| FetchError::Network("connection refused".to_string()))
    }
}

/// Two-screen document: "a" links to "b".
pub const SCENARIO_DOCUMENT: &str = r#"{"screens":[
    {"id":"a","title":"Home","type":"list","rows":[
        {"title":"Go","actionType":"showScreen","action":{"id":"b"}}
    ]},
    {"id":"b","title":"Other","type":"list","rows":[]}
]}"#;

/// Creates an engine over [`SCENARIO_DOCUMENT`].
pub fn scenario_engine(retriever: StubRetriever) -> Arc<NavigationEngine> {
    let app = Application::parse(SCENARIO_DOCUMENT.as_bytes()).unwrap();
    let registry = ScreenRegistry::build(app).unwrap();
    Arc::new(NavigationEngine::new(registry, Arc::new(retriever)))
}
