//! # Screen Model
//!
//! Typed view of the application document:
//!
//! ```text
//! Application
//! └── screens: Vec<Screen>
//!     ├── id, title, kind        // kind is the wire `type`, opaque here
//!     ├── rows: Vec<Row>         // title + optional Action
//!     └── primary_action: Option<Button>   // wire `rightButton`
//! ```
//!
//! Parsing happens in two steps: serde reads the raw wire shape, then each
//! `actionType`/`action` pair goes through [`action::decode_optional`]. Either
//! the whole document decodes or nothing does.

use std::fmt;

use log::debug;
use serde::Deserialize;
use serde_json::Value;

use crate::core::action::{self, Action, ActionError};

// ============================================================================
// Wire Types
// ============================================================================

#[derive(Deserialize, Debug)]
struct RawApplication {
    screens: Vec<RawScreen>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct RawScreen {
    id: String,
    title: String,
    #[serde(rename = "type")]
    kind: String,
    rows: Vec<RawSelectable>,
    #[serde(default)]
    right_button: Option<RawSelectable>,
}

/// Rows and buttons share the same wire shape.
#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct RawSelectable {
    title: String,
    #[serde(default)]
    action_type: Option<String>,
    #[serde(default)]
    action: Option<Value>,
}

// ============================================================================
// Typed Model
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct Application {
    pub screens: Vec<Screen>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Screen {
    pub id: String,
    pub title: String,
    /// Presentation hint (`"list"`, ...). Never interpreted by the engine.
    pub kind: String,
    pub rows: Vec<Row>,
    pub primary_action: Option<Button>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub title: String,
    pub action: Option<Action>,
}

/// The screen-level button, usually drawn in the title bar.
#[derive(Debug, Clone, PartialEq)]
pub struct Button {
    pub title: String,
    pub action: Option<Action>,
}

impl Row {
    /// Rows without an action can't be selected meaningfully.
    pub fn is_inert(&self) -> bool {
        self.action.is_none()
    }

    pub fn presents_new_screen(&self) -> bool {
        self.action.as_ref().is_some_and(Action::presents_new_screen)
    }
}

impl Button {
    pub fn presents_new_screen(&self) -> bool {
        self.action.as_ref().is_some_and(Action::presents_new_screen)
    }
}

impl Screen {
    pub fn row(&self, index: usize) -> Option<&Row> {
        self.rows.get(index)
    }

    /// All actions on this screen with where they live, rows first.
    pub fn actions(&self) -> impl Iterator<Item = (Location, &Action)> {
        let rows = self.rows.iter().enumerate().filter_map(move |(index, row)| {
            row.action
                .as_ref()
                .map(|a| (Location::row(&self.id, index), a))
        });
        let button = self
            .primary_action
            .iter()
            .filter_map(move |b| b.action.as_ref().map(|a| (Location::button(&self.id), a)));
        rows.chain(button)
    }
}

/// Where in the document something sits. Used in diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub screen_id: String,
    /// `None` means the screen's right button.
    pub row: Option<usize>,
}

impl Location {
    pub fn row(screen_id: &str, index: usize) -> Self {
        Self {
            screen_id: screen_id.to_string(),
            row: Some(index),
        }
    }

    pub fn button(screen_id: &str) -> Self {
        Self {
            screen_id: screen_id.to_string(),
            row: None,
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.row {
            Some(index) => write!(f, "screen {:?} row {}", self.screen_id, index),
            None => write!(f, "screen {:?} rightButton", self.screen_id),
        }
    }
}

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug)]
pub enum DocumentError {
    /// Not JSON, or JSON that doesn't fit the document schema.
    InvalidDocument(serde_json::Error),
    /// A row or button carries an action that doesn't decode.
    Action {
        location: Location,
        error: ActionError,
    },
}

impl fmt::Display for DocumentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentError::InvalidDocument(e) => write!(f, "invalid document: {e}"),
            DocumentError::Action { location, error } => write!(f, "{location}: {error}"),
        }
    }
}

impl std::error::Error for DocumentError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DocumentError::InvalidDocument(e) => Some(e),
            DocumentError::Action { error, .. } => Some(error),
        }
    }
}

// ============================================================================
// Parsing
// ============================================================================

impl Application {
    /// Parses a complete document. Partial documents are rejected.
    pub fn parse(bytes: &[u8]) -> Result<Application, DocumentError> {
        let raw: RawApplication =
            serde_json::from_slice(bytes).map_err(DocumentError::InvalidDocument)?;

        let screens = raw
            .screens
            .into_iter()
            .map(convert_screen)
            .collect::<Result<Vec<_>, _>>()?;

        debug!("Parsed document with {} screens", screens.len());
        Ok(Application { screens })
    }
}

fn convert_screen(raw: RawScreen) -> Result<Screen, DocumentError> {
    let rows = raw
        .rows
        .into_iter()
        .enumerate()
        .map(|(index, row)| {
            let action = convert_action(&row, || Location::row(&raw.id, index))?;
            Ok::<_, DocumentError>(Row {
                title: row.title,
                action,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let primary_action = raw
        .right_button
        .map(|button| {
            let action = convert_action(&button, || Location::button(&raw.id))?;
            Ok::<_, DocumentError>(Button {
                title: button.title,
                action,
            })
        })
        .transpose()?;

    Ok(Screen {
        id: raw.id,
        title: raw.title,
        kind: raw.kind,
        rows,
        primary_action,
    })
}

fn convert_action(
    raw: &RawSelectable,
    location: impl FnOnce() -> Location,
) -> Result<Option<Action>, DocumentError> {
    action::decode_optional(raw.action_type.as_deref(), raw.action.as_ref()).map_err(|error| {
        DocumentError::Action {
            location: location(),
            error,
        }
    })
}
