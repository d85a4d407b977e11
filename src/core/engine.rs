//! # Navigation Engine
//!
//! Turns a selected row's [`Action`] into exactly one effect on the host.
//!
//! ```text
//!            execute(alert | site | screen | share | media | call)
//!   ┌──────┐ ───────────────────────────────────────────────────▶ ┌──────┐
//!   │ Idle │                                                      │ Idle │
//!   └──┬───┘                                                      └──────┘
//!      │ execute(preview)                                             ▲
//!      ▼                                                              │
//!   ┌───────────┐   retrieve(url) settles → push_preview / report ────┘
//!   │ Resolving │
//!   └───────────┘
//! ```
//!
//! Six of the seven kinds finish before `execute` returns. Previews spawn a
//! retrieval task and hand back its `JoinHandle`; the caller is never blocked.
//! Overlapping previews are independent; the engine counts them so `state()`
//! reports `Resolving` while any is pending.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use log::{debug, error, info, warn};
use reqwest::Url;
use tokio::task::JoinHandle;

use crate::core::action::Action;
use crate::core::port::{PresentationPort, ShareItem};
use crate::core::registry::ScreenRegistry;
use crate::fetch::{FetchError, FileRetriever};

/// What `execute` did.
#[derive(Debug)]
pub enum Dispatch {
    /// Nothing happened: inert row, empty share, call not possible.
    Ignored,
    /// A port call was made before returning.
    Presented,
    /// A preview retrieval is running; the port hears about it on completion.
    Retrieving(JoinHandle<()>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Idle,
    Resolving { in_flight: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationError {
    /// `showScreen` names a screen the document doesn't have. The document
    /// itself is inconsistent; this navigation is aborted.
    UnknownScreen(String),
    /// A preview was requested outside a tokio runtime. The port still gets
    /// `report_preview_unavailable`.
    NoRuntime,
}

impl fmt::Display for NavigationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NavigationError::UnknownScreen(id) => {
                write!(f, "document integrity error: no screen with id {id:?}")
            }
            NavigationError::NoRuntime => write!(f, "preview requires a tokio runtime"),
        }
    }
}

impl std::error::Error for NavigationError {}

#[derive(Debug)]
pub enum PreviewError {
    /// The action carries no url to retrieve.
    MissingUrl,
    Retrieval(FetchError),
}

impl fmt::Display for PreviewError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PreviewError::MissingUrl => write!(f, "preview has no file url"),
            PreviewError::Retrieval(e) => write!(f, "could not retrieve file: {e}"),
        }
    }
}

impl std::error::Error for PreviewError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PreviewError::MissingUrl => None,
            PreviewError::Retrieval(e) => Some(e),
        }
    }
}

/// Counts one pending retrieval for as long as it lives.
struct InFlight(Arc<AtomicUsize>);

impl InFlight {
    fn enter(counter: &Arc<AtomicUsize>) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        InFlight(Arc::clone(counter))
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

pub struct NavigationEngine {
    registry: ScreenRegistry,
    retriever: Arc<dyn FileRetriever>,
    in_flight: Arc<AtomicUsize>,
}

impl NavigationEngine {
    pub fn new(registry: ScreenRegistry, retriever: Arc<dyn FileRetriever>) -> Self {
        Self {
            registry,
            retriever,
            in_flight: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn registry(&self) -> &ScreenRegistry {
        &self.registry
    }

    pub fn state(&self) -> EngineState {
        match self.in_flight.load(Ordering::SeqCst) {
            0 => EngineState::Idle,
            in_flight => EngineState::Resolving { in_flight },
        }
    }

    /// Resolves `action` to its effect on `port`.
    ///
    /// Errors abort this call only and leave the engine usable: `ShowScreen`
    /// to an unknown id, or a preview with no tokio runtime to run on.
    pub fn execute(
        self: &Arc<Self>,
        action: Option<&Action>,
        port: &Arc<dyn PresentationPort>,
    ) -> Result<Dispatch, NavigationError> {
        let Some(action) = action else {
            return Ok(Dispatch::Ignored);
        };
        debug!("Executing {} action", action.kind());

        match action {
            Action::Alert { title, message } => {
                port.present_alert(title, message);
                Ok(Dispatch::Presented)
            }
            Action::OpenExternalSite { url } => {
                port.present_external_browser(url);
                Ok(Dispatch::Presented)
            }
            Action::ShowScreen { target_id } => match self.registry.lookup(target_id) {
                Ok(screen) => {
                    info!("Pushing screen {:?}", screen.id);
                    port.push_screen(screen, Arc::clone(self));
                    Ok(Dispatch::Presented)
                }
                Err(e) => {
                    error!("Cannot show screen: {}", e);
                    Err(NavigationError::UnknownScreen(target_id.clone()))
                }
            },
            Action::Share { text, url } => {
                let items = share_items(text.as_deref(), url.as_ref());
                if items.is_empty() {
                    debug!("Share action has nothing to share, ignoring");
                    return Ok(Dispatch::Ignored);
                }
                port.present_share_sheet(&items);
                Ok(Dispatch::Presented)
            }
            Action::PlayMedia { url } => {
                port.present_media_player(url);
                Ok(Dispatch::Presented)
            }
            Action::PreviewFile { url, name } => {
                let Ok(runtime) = tokio::runtime::Handle::try_current() else {
                    let err = NavigationError::NoRuntime;
                    error!("Cannot start preview: {}", err);
                    port.report_preview_unavailable(&err.to_string());
                    return Err(err);
                };
                let guard = InFlight::enter(&self.in_flight);
                let engine = Arc::clone(self);
                let port = Arc::clone(port);
                let url = url.clone();
                let name = name.clone();
                let task = runtime.spawn(async move {
                    let _ = engine
                        .finish_preview(guard, url.as_ref(), name.as_deref(), port.as_ref())
                        .await;
                });
                Ok(Dispatch::Retrieving(task))
            }
            Action::PlaceCall { phone } => {
                let Some(phone) = phone.as_deref() else {
                    return Ok(Dispatch::Ignored);
                };
                match Url::parse(&format!("tel://{phone}")) {
                    Ok(tel) if port.can_open_url(&tel) => {
                        port.place_call(phone);
                        Ok(Dispatch::Presented)
                    }
                    _ => {
                        debug!("Host cannot call {:?}, ignoring", phone);
                        Ok(Dispatch::Ignored)
                    }
                }
            }
        }
    }

    /// Retrieves the file and presents it, awaiting in place.
    ///
    /// Failures are reported to `port` as well as returned.
    pub async fn preview(
        &self,
        url: Option<&Url>,
        name: Option<&str>,
        port: &dyn PresentationPort,
    ) -> Result<PathBuf, PreviewError> {
        let guard = InFlight::enter(&self.in_flight);
        self.finish_preview(guard, url, name, port).await
    }

    async fn finish_preview(
        &self,
        guard: InFlight,
        url: Option<&Url>,
        name: Option<&str>,
        port: &dyn PresentationPort,
    ) -> Result<PathBuf, PreviewError> {
        let result = match url {
            Some(url) => {
                info!("Retrieving {} for preview", url);
                self.retriever
                    .retrieve(url)
                    .await
                    .map_err(PreviewError::Retrieval)
            }
            None => Err(PreviewError::MissingUrl),
        };
        // Back to idle before the host hears about it.
        drop(guard);

        match &result {
            Ok(path) => {
                info!("Preview ready at {}", path.display());
                port.push_preview(path, name);
            }
            Err(e) => {
                let transient = matches!(e, PreviewError::Retrieval(f) if f.is_transient());
                warn!("Preview unavailable (transient: {}): {}", transient, e);
                port.report_preview_unavailable(&e.to_string());
            }
        }
        result
    }
}

/// Share sheet entries: text first, then url, skipping what's absent.
fn share_items(text: Option<&str>, url: Option<&Url>) -> Vec<ShareItem> {
    text.map(|t| ShareItem::Text(t.to_string()))
        .into_iter()
        .chain(url.map(|u| ShareItem::Url(u.clone())))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::screen::{Application, Row, Screen};
    use crate::test_support::{PortCall, RecordingPort, StubRetriever, scenario_engine};

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    fn port_pair() -> (Arc<RecordingPort>, Arc<dyn PresentationPort>) {
        let recording = Arc::new(RecordingPort::default());
        let port: Arc<dyn PresentationPort> = recording.clone();
        (recording, port)
    }

    #[test]
    fn test_absent_action_is_noop() {
        let engine = scenario_engine(StubRetriever::failing());
        let (recording, port) = port_pair();
        let dispatch = engine.execute(None, &port).unwrap();
        assert!(matches!(dispatch, Dispatch::Ignored));
        assert!(recording.calls().is_empty());
    }

    #[test]
    fn test_alert_presents_alert() {
        let engine = scenario_engine(StubRetriever::failing());
        let (recording, port) = port_pair();
        let action = Action::Alert {
            title: "Hello".into(),
            message: "World".into(),
        };
        engine.execute(Some(&action), &port).unwrap();
        assert_eq!(
            recording.calls(),
            vec![PortCall::Alert {
                title: "Hello".into(),
                message: "World".into()
            }]
        );
    }

    #[test]
    fn test_site_and_media() {
        let engine = scenario_engine(StubRetriever::failing());
        let (recording, port) = port_pair();
        let site = Action::OpenExternalSite {
            url: url("https://example.com/"),
        };
        let media = Action::PlayMedia {
            url: url("https://example.com/clip.mp4"),
        };
        engine.execute(Some(&site), &port).unwrap();
        engine.execute(Some(&media), &port).unwrap();
        assert_eq!(
            recording.calls(),
            vec![
                PortCall::ExternalBrowser(url("https://example.com/")),
                PortCall::MediaPlayer(url("https://example.com/clip.mp4")),
            ]
        );
    }

    #[test]
    fn test_show_screen_pushes_target_with_shared_engine() {
        let engine = scenario_engine(StubRetriever::failing());
        let (recording, port) = port_pair();
        let action = Action::ShowScreen { target_id: "b".into() };
        engine.execute(Some(&action), &port).unwrap();
        assert_eq!(recording.calls(), vec![PortCall::PushScreen("b".into())]);
        assert!(Arc::ptr_eq(&recording.last_engine().unwrap(), &engine));
    }

    #[test]
    fn test_show_unknown_screen_is_integrity_error() {
        let engine = scenario_engine(StubRetriever::failing());
        let (recording, port) = port_pair();
        let action = Action::ShowScreen {
            target_id: "missing".into(),
        };
        let err = engine.execute(Some(&action), &port).unwrap_err();
        assert_eq!(err, NavigationError::UnknownScreen("missing".into()));
        assert!(recording.calls().is_empty());

        // The engine keeps working afterwards.
        let ok = Action::ShowScreen { target_id: "a".into() };
        assert!(engine.execute(Some(&ok), &port).is_ok());
    }

    #[test]
    fn test_empty_share_is_noop() {
        let engine = scenario_engine(StubRetriever::failing());
        let (recording, port) = port_pair();
        let action = Action::Share { text: None, url: None };
        let dispatch = engine.execute(Some(&action), &port).unwrap();
        assert!(matches!(dispatch, Dispatch::Ignored));
        assert!(recording.calls().is_empty());
    }

    #[test]
    fn test_share_items_keep_text_then_url() {
        let engine = scenario_engine(StubRetriever::failing());
        let (recording, port) = port_pair();
        let action = Action::Share {
            text: Some("look".into()),
            url: Some(url("https://example.com/")),
        };
        engine.execute(Some(&action), &port).unwrap();
        assert_eq!(
            recording.calls(),
            vec![PortCall::ShareSheet(vec![
                ShareItem::Text("look".into()),
                ShareItem::Url(url("https://example.com/")),
            ])]
        );

        let url_only = Action::Share {
            text: None,
            url: Some(url("https://example.com/x")),
        };
        engine.execute(Some(&url_only), &port).unwrap();
        assert_eq!(
            recording.calls()[1],
            PortCall::ShareSheet(vec![ShareItem::Url(url("https://example.com/x"))])
        );
    }

    #[test]
    fn test_place_call_requires_openable_tel_url() {
        let engine = scenario_engine(StubRetriever::failing());
        let (recording, port) = port_pair();
        let call = Action::PlaceCall {
            phone: Some("5550100".into()),
        };

        engine.execute(Some(&call), &port).unwrap();
        assert!(recording.calls().is_empty());

        recording.allow_urls(true);
        engine.execute(Some(&call), &port).unwrap();
        assert_eq!(recording.calls(), vec![PortCall::PlaceCall("5550100".into())]);
    }

    #[test]
    fn test_place_call_without_phone_is_noop() {
        let engine = scenario_engine(StubRetriever::failing());
        let (recording, port) = port_pair();
        recording.allow_urls(true);
        let dispatch = engine
            .execute(Some(&Action::PlaceCall { phone: None }), &port)
            .unwrap();
        assert!(matches!(dispatch, Dispatch::Ignored));
        assert!(recording.calls().is_empty());
    }

    #[test]
    fn test_preview_outside_runtime_fails_cleanly() {
        let engine = scenario_engine(StubRetriever::failing());
        let (recording, port) = port_pair();
        let action = Action::PreviewFile {
            url: Some(url("https://example.com/doc.pdf")),
            name: None,
        };
        let err = engine.execute(Some(&action), &port).unwrap_err();
        assert_eq!(err, NavigationError::NoRuntime);
        assert_eq!(engine.state(), EngineState::Idle);
        assert_eq!(
            recording.calls(),
            vec![PortCall::PreviewUnavailable(
                "preview requires a tokio runtime".into()
            )]
        );
    }

    #[tokio::test]
    async fn test_preview_success_pushes_local_path() {
        let engine = scenario_engine(StubRetriever::returning("/tmp/doc.pdf"));
        let (recording, port) = port_pair();
        let action = Action::PreviewFile {
            url: Some(url("https://example.com/doc.pdf")),
            name: Some("Doc".into()),
        };
        let Dispatch::Retrieving(task) = engine.execute(Some(&action), &port).unwrap() else {
            panic!("preview should spawn a retrieval");
        };
        task.await.unwrap();
        assert_eq!(engine.state(), EngineState::Idle);
        assert_eq!(
            recording.calls(),
            vec![PortCall::Preview {
                path: PathBuf::from("/tmp/doc.pdf"),
                name: Some("Doc".into()),
            }]
        );
    }

    #[tokio::test]
    async fn test_preview_failure_reports_unavailable() {
        let engine = scenario_engine(StubRetriever::failing());
        let (recording, port) = port_pair();
        let action = Action::PreviewFile {
            url: Some(url("https://example.com/doc.pdf")),
            name: None,
        };
        let Dispatch::Retrieving(task) = engine.execute(Some(&action), &port).unwrap() else {
            panic!("preview should spawn a retrieval");
        };
        task.await.unwrap();
        assert_eq!(engine.state(), EngineState::Idle);
        assert!(matches!(
            recording.calls().as_slice(),
            [PortCall::PreviewUnavailable(_)]
        ));
    }

    #[tokio::test]
    async fn test_preview_without_url_reports_unavailable() {
        let engine = scenario_engine(StubRetriever::returning("/tmp/unused"));
        let (recording, port) = port_pair();
        let err = engine.preview(None, Some("Nothing"), port.as_ref()).await.unwrap_err();
        assert!(matches!(err, PreviewError::MissingUrl));
        assert_eq!(
            recording.calls(),
            vec![PortCall::PreviewUnavailable("preview has no file url".into())]
        );
    }

    #[tokio::test]
    async fn test_state_is_resolving_while_retrieval_pending() {
        let (retriever, release) = StubRetriever::gated("/tmp/slow.pdf");
        let engine = scenario_engine(retriever);
        let (recording, port) = port_pair();
        let action = Action::PreviewFile {
            url: Some(url("https://example.com/slow.pdf")),
            name: None,
        };

        let Dispatch::Retrieving(first) = engine.execute(Some(&action), &port).unwrap() else {
            panic!("preview should spawn a retrieval");
        };
        let Dispatch::Retrieving(second) = engine.execute(Some(&action), &port).unwrap() else {
            panic!("preview should spawn a retrieval");
        };
        assert_eq!(engine.state(), EngineState::Resolving { in_flight: 2 });

        release.add_permits(2);
        first.await.unwrap();
        second.await.unwrap();

        assert_eq!(engine.state(), EngineState::Idle);
        assert_eq!(recording.calls().len(), 2);
    }

    #[test]
    fn test_scenario_row_pushes_exactly_one_screen() {
        let doc = r#"{"screens":[
            {"id":"a","title":"Home","type":"list","rows":[{"title":"Go","actionType":"showScreen","action":{"id":"b"}}]},
            {"id":"b","title":"Other","type":"list","rows":[]}
        ]}"#;
        let app = Application::parse(doc.as_bytes()).unwrap();
        let registry = ScreenRegistry::build(app).unwrap();
        assert_eq!(registry.len(), 2);
        let engine = Arc::new(NavigationEngine::new(
            registry,
            Arc::new(StubRetriever::failing()),
        ));
        let (recording, port) = port_pair();

        let entry = engine.registry().entry_screen().unwrap();
        engine.execute(entry.rows[0].action.as_ref(), &port).unwrap();
        assert_eq!(recording.calls(), vec![PortCall::PushScreen("b".into())]);
    }

    #[test]
    fn test_inert_row_from_screen() {
        let screen = Screen {
            id: "x".into(),
            title: "X".into(),
            kind: "list".into(),
            rows: vec![Row {
                title: "nothing".into(),
                action: None,
            }],
            primary_action: None,
        };
        let engine = scenario_engine(StubRetriever::failing());
        let (recording, port) = port_pair();
        engine.execute(screen.rows[0].action.as_ref(), &port).unwrap();
        assert!(recording.calls().is_empty());
    }
}
