//! # Session
//!
//! One loaded document: fetched, parsed, indexed, and wrapped in an engine.
//! Built explicitly at startup and passed down; nothing here is global.
//!
//! ```text
//! DocumentSource::fetch ─▶ Application::parse ─▶ ScreenRegistry::build ─▶ NavigationEngine
//! ```
//!
//! Any failure on the way is fatal to startup. There is no fallback to a
//! partially decoded document.

use std::fmt;
use std::sync::Arc;

use log::{info, warn};

use crate::core::engine::NavigationEngine;
use crate::core::port::PresentationPort;
use crate::core::registry::{DanglingLink, RegistryError, ScreenRegistry};
use crate::core::screen::{Application, DocumentError, Screen};
use crate::fetch::{DocumentSource, FetchError, FileRetriever};

#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    /// Reject documents whose `showScreen` actions point at missing screens.
    pub strict_links: bool,
}

#[derive(Debug)]
pub enum LoadError {
    Fetch(FetchError),
    Document(DocumentError),
    Registry(RegistryError),
    DanglingLinks(Vec<DanglingLink>),
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadError::Fetch(e) => write!(f, "could not fetch document: {e}"),
            LoadError::Document(e) => write!(f, "{e}"),
            LoadError::Registry(e) => write!(f, "{e}"),
            LoadError::DanglingLinks(links) => {
                write!(f, "{} dangling screen link(s)", links.len())?;
                for link in links {
                    write!(f, "\n  {link}")?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for LoadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LoadError::Fetch(e) => Some(e),
            LoadError::Document(e) => Some(e),
            LoadError::Registry(e) => Some(e),
            LoadError::DanglingLinks(_) => None,
        }
    }
}

impl From<FetchError> for LoadError {
    fn from(e: FetchError) -> Self {
        LoadError::Fetch(e)
    }
}

impl From<DocumentError> for LoadError {
    fn from(e: DocumentError) -> Self {
        LoadError::Document(e)
    }
}

impl From<RegistryError> for LoadError {
    fn from(e: RegistryError) -> Self {
        LoadError::Registry(e)
    }
}

pub struct Session {
    engine: Arc<NavigationEngine>,
    entry: Arc<Screen>,
    dangling: Vec<DanglingLink>,
}

impl Session {
    pub async fn load(
        source: &dyn DocumentSource,
        retriever: Arc<dyn FileRetriever>,
        options: &LoadOptions,
    ) -> Result<Session, LoadError> {
        info!("Loading document from {}", source.describe());
        let bytes = source.fetch().await?;
        Self::from_bytes(&bytes, retriever, options)
    }

    /// Same as [`Session::load`] for bytes already in hand.
    pub fn from_bytes(
        bytes: &[u8],
        retriever: Arc<dyn FileRetriever>,
        options: &LoadOptions,
    ) -> Result<Session, LoadError> {
        let app = Application::parse(bytes)?;
        let registry = ScreenRegistry::build(app)?;
        let entry = registry.entry_screen()?;

        let dangling = registry.dangling_links();
        for link in &dangling {
            warn!("{}", link);
        }
        if options.strict_links && !dangling.is_empty() {
            return Err(LoadError::DanglingLinks(dangling));
        }

        info!(
            "Document loaded: {} screens, entry {:?}",
            registry.len(),
            entry.id
        );
        Ok(Session {
            engine: Arc::new(NavigationEngine::new(registry, retriever)),
            entry,
            dangling,
        })
    }

    pub fn engine(&self) -> &Arc<NavigationEngine> {
        &self.engine
    }

    pub fn entry_screen(&self) -> &Arc<Screen> {
        &self.entry
    }

    /// Links that would fail if selected. Empty for a consistent document.
    pub fn dangling_links(&self) -> &[DanglingLink] {
        &self.dangling
    }

    /// Hands the first screen (or `start_at`, when given) to the host.
    pub fn present(
        &self,
        port: &dyn PresentationPort,
        start_at: Option<&str>,
    ) -> Result<(), RegistryError> {
        let screen = match start_at {
            Some(id) => self.engine.registry().lookup(id)?,
            None => Arc::clone(&self.entry),
        };
        port.push_screen(screen, Arc::clone(&self.engine));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{PortCall, RecordingPort, SCENARIO_DOCUMENT, StubRetriever};

    fn retriever() -> Arc<dyn FileRetriever> {
        Arc::new(StubRetriever::failing())
    }

    const BROKEN_LINK: &str = r#"{"screens":[{"id":"a","title":"A","type":"list","rows":[
        {"title":"x","actionType":"showScreen","action":{"id":"gone"}}
    ]}]}"#;

    #[test]
    fn test_from_bytes_builds_session() {
        let session =
            Session::from_bytes(SCENARIO_DOCUMENT.as_bytes(), retriever(), &LoadOptions::default())
                .unwrap();
        assert_eq!(session.entry_screen().id, "a");
        assert_eq!(session.engine().registry().len(), 2);
        assert!(session.dangling_links().is_empty());
    }

    #[test]
    fn test_demo_catalog_loads_cleanly() {
        let options = LoadOptions { strict_links: true };
        let session = Session::from_bytes(
            include_bytes!("../../demos/catalog.json"),
            retriever(),
            &options,
        )
        .unwrap();
        assert_eq!(session.entry_screen().id, "home");
        assert!(session.entry_screen().primary_action.is_some());
    }

    #[test]
    fn test_empty_document_fails_to_load() {
        let err = Session::from_bytes(br#"{"screens":[]}"#, retriever(), &LoadOptions::default())
            .err()
            .unwrap();
        assert!(matches!(err, LoadError::Registry(RegistryError::EmptyDocument)));
    }

    #[test]
    fn test_dangling_links_tolerated_by_default() {
        let session =
            Session::from_bytes(BROKEN_LINK.as_bytes(), retriever(), &LoadOptions::default())
                .unwrap();
        assert_eq!(session.dangling_links().len(), 1);
    }

    #[test]
    fn test_strict_links_rejects_dangling() {
        let options = LoadOptions { strict_links: true };
        let err = Session::from_bytes(BROKEN_LINK.as_bytes(), retriever(), &options)
            .err()
            .unwrap();
        assert!(matches!(err, LoadError::DanglingLinks(ref links) if links.len() == 1));
        assert!(err.to_string().contains("missing screen \"gone\""));
    }

    #[test]
    fn test_present_entry_or_named_screen() {
        let session =
            Session::from_bytes(SCENARIO_DOCUMENT.as_bytes(), retriever(), &LoadOptions::default())
                .unwrap();
        let port = RecordingPort::default();

        session.present(&port, None).unwrap();
        session.present(&port, Some("b")).unwrap();
        assert_eq!(
            session.present(&port, Some("zzz")).unwrap_err(),
            RegistryError::UnknownScreen("zzz".into())
        );
        assert_eq!(
            port.calls(),
            vec![PortCall::PushScreen("a".into()), PortCall::PushScreen("b".into())]
        );
    }
}
