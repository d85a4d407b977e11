//! # Actions
//!
//! Everything a row or button can do becomes an `Action`.
//! The document names the kind with a string tag (`actionType`) and carries
//! the kind-specific payload next to it (`action`):
//!
//! ```text
//! { "title": "Call us", "actionType": "phoneCall", "action": { "phone": "555-0100" } }
//!                                     └── tag ──┘            └──── payload ─────┘
//! ```
//!
//! `decode()` maps the tag to a variant through `ActionKind::ALL` and then
//! reads the payload fields. It never touches I/O.

use std::fmt;

use reqwest::Url;
use serde_json::{Map, Value};

// ============================================================================
// Action Vocabulary
// ============================================================================

/// The closed set of things a selection can trigger.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Modal message. Terminal, no navigation.
    Alert { title: String, message: String },
    /// Hand the url to an external browsing surface.
    OpenExternalSite { url: Url },
    /// Push another screen of the same document by id.
    ShowScreen { target_id: String },
    /// Share sheet with whatever of text/url is present.
    Share { text: Option<String>, url: Option<Url> },
    /// Media playback surface.
    PlayMedia { url: Url },
    /// Retrieve the file first, then show it in a preview surface.
    PreviewFile { url: Option<Url>, name: Option<String> },
    /// Dial a phone number if the host can.
    PlaceCall { phone: Option<String> },
}

/// Discriminant of [`Action`], one per wire tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    Alert,
    OpenExternalSite,
    ShowScreen,
    Share,
    PlayMedia,
    PreviewFile,
    PlaceCall,
}

impl ActionKind {
    /// Every kind, in wire-table order.
    pub const ALL: [ActionKind; 7] = [
        ActionKind::Alert,
        ActionKind::OpenExternalSite,
        ActionKind::ShowScreen,
        ActionKind::Share,
        ActionKind::PlayMedia,
        ActionKind::PreviewFile,
        ActionKind::PlaceCall,
    ];

    /// The literal `actionType` string used in documents.
    pub fn tag(self) -> &'static str {
        match self {
            ActionKind::Alert => "alert",
            ActionKind::OpenExternalSite => "showWebsite",
            ActionKind::ShowScreen => "showScreen",
            ActionKind::Share => "share",
            ActionKind::PlayMedia => "playMovie",
            ActionKind::PreviewFile => "quickLook",
            ActionKind::PlaceCall => "phoneCall",
        }
    }

    /// Looks up a kind by its wire tag. Tags are case-sensitive.
    pub fn from_tag(tag: &str) -> Option<ActionKind> {
        ActionKind::ALL.into_iter().find(|kind| kind.tag() == tag)
    }

    /// Whether selecting an action of this kind navigates somewhere.
    /// Drives the disclosure indicator and row auto-deselection.
    pub fn presents_new_screen(self) -> bool {
        match self {
            ActionKind::OpenExternalSite
            | ActionKind::ShowScreen
            | ActionKind::PlayMedia
            | ActionKind::PreviewFile => true,
            ActionKind::Alert | ActionKind::Share | ActionKind::PlaceCall => false,
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl Action {
    pub fn kind(&self) -> ActionKind {
        match self {
            Action::Alert { .. } => ActionKind::Alert,
            Action::OpenExternalSite { .. } => ActionKind::OpenExternalSite,
            Action::ShowScreen { .. } => ActionKind::ShowScreen,
            Action::Share { .. } => ActionKind::Share,
            Action::PlayMedia { .. } => ActionKind::PlayMedia,
            Action::PreviewFile { .. } => ActionKind::PreviewFile,
            Action::PlaceCall { .. } => ActionKind::PlaceCall,
        }
    }

    pub fn presents_new_screen(&self) -> bool {
        self.kind().presents_new_screen()
    }
}

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionError {
    /// `actionType` is not one of the seven known tags.
    UnknownActionKind(String),
    /// A required field is missing, or a field has the wrong shape.
    /// Carries the offending field name.
    MalformedAction(String),
}

impl fmt::Display for ActionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionError::UnknownActionKind(tag) => write!(f, "unknown action type: {tag:?}"),
            ActionError::MalformedAction(field) => {
                write!(f, "malformed action: bad or missing field `{field}`")
            }
        }
    }
}

impl std::error::Error for ActionError {}

// ============================================================================
// Decoding
// ============================================================================

/// Decodes one action from its tag and payload object.
pub fn decode(tag: &str, payload: &Value) -> Result<Action, ActionError> {
    let kind =
        ActionKind::from_tag(tag).ok_or_else(|| ActionError::UnknownActionKind(tag.to_string()))?;
    let fields = payload
        .as_object()
        .ok_or_else(|| ActionError::MalformedAction("action".to_string()))?;

    let action = match kind {
        ActionKind::Alert => Action::Alert {
            title: required_str(fields, "title")?,
            message: required_str(fields, "message")?,
        },
        ActionKind::OpenExternalSite => Action::OpenExternalSite {
            url: required_url(fields, "url")?,
        },
        ActionKind::ShowScreen => Action::ShowScreen {
            target_id: required_str(fields, "id")?,
        },
        ActionKind::Share => Action::Share {
            text: optional_str(fields, "text")?,
            url: optional_url(fields, "url")?,
        },
        ActionKind::PlayMedia => Action::PlayMedia {
            url: required_url(fields, "url")?,
        },
        ActionKind::PreviewFile => Action::PreviewFile {
            url: optional_url(fields, "url")?,
            name: optional_str(fields, "name")?,
        },
        ActionKind::PlaceCall => Action::PlaceCall {
            phone: optional_str(fields, "phone")?,
        },
    };
    Ok(action)
}

/// Decodes the `actionType`/`action` pair of a row or button.
///
/// No tag means no action, whatever the payload holds. A tag without a
/// payload (absent or `null`) is malformed rather than silently inert.
pub fn decode_optional(
    action_type: Option<&str>,
    action: Option<&Value>,
) -> Result<Option<Action>, ActionError> {
    let Some(tag) = action_type else {
        return Ok(None);
    };
    match action {
        Some(payload) if !payload.is_null() => decode(tag, payload).map(Some),
        _ => Err(ActionError::MalformedAction("action".to_string())),
    }
}

fn optional_str(fields: &Map<String, Value>, name: &str) -> Result<Option<String>, ActionError> {
    match fields.get(name) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(_) => Err(ActionError::MalformedAction(name.to_string())),
    }
}

fn required_str(fields: &Map<String, Value>, name: &str) -> Result<String, ActionError> {
    optional_str(fields, name)?.ok_or_else(|| ActionError::MalformedAction(name.to_string()))
}

fn optional_url(fields: &Map<String, Value>, name: &str) -> Result<Option<Url>, ActionError> {
    optional_str(fields, name)?
        .map(|raw| Url::parse(&raw).map_err(|_| ActionError::MalformedAction(name.to_string())))
        .transpose()
}

fn required_url(fields: &Map<String, Value>, name: &str) -> Result<Url, ActionError> {
    optional_url(fields, name)?.ok_or_else(|| ActionError::MalformedAction(name.to_string()))
}
