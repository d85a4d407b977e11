//! # Presentation Port
//!
//! Everything the engine asks of the host UI. The core never draws anything;
//! it decides *what* should happen and calls one of these.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use reqwest::Url;

use crate::core::engine::NavigationEngine;
use crate::core::screen::Screen;

/// One entry of a share sheet.
#[derive(Debug, Clone, PartialEq)]
pub enum ShareItem {
    Text(String),
    Url(Url),
}

impl fmt::Display for ShareItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShareItem::Text(text) => f.write_str(text),
            ShareItem::Url(url) => f.write_str(url.as_str()),
        }
    }
}

/// Host-side capabilities. Implementations must be callable from the
/// preview retrieval task, hence `Send + Sync`.
pub trait PresentationPort: Send + Sync {
    /// Show `screen`. Row selections on it go back through `engine`.
    fn push_screen(&self, screen: Arc<Screen>, engine: Arc<NavigationEngine>);

    fn present_alert(&self, title: &str, message: &str);

    fn present_external_browser(&self, url: &Url);

    /// `items` is never empty.
    fn present_share_sheet(&self, items: &[ShareItem]);

    fn present_media_player(&self, url: &Url);

    fn push_preview(&self, local_path: &Path, name: Option<&str>);

    /// Whether the host could open `url` (e.g. a `tel:` link) right now.
    fn can_open_url(&self, url: &Url) -> bool;

    fn place_call(&self, phone: &str);

    /// Dismissable notice; the engine stays usable afterwards.
    fn report_preview_unavailable(&self, reason: &str);
}
