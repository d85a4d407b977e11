//! # Screen Registry
//!
//! Screens of one document, indexed by id. Built once, read-only after.
//!
//! Document order is kept alongside the index so the entry screen is
//! always the first screen of the document.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use log::debug;

use crate::core::action::Action;
use crate::core::screen::{Application, Location, Screen};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    DuplicateScreenId(String),
    UnknownScreen(String),
    EmptyDocument,
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistryError::DuplicateScreenId(id) => write!(f, "duplicate screen id: {id:?}"),
            RegistryError::UnknownScreen(id) => write!(f, "unknown screen: {id:?}"),
            RegistryError::EmptyDocument => write!(f, "document contains no screens"),
        }
    }
}

impl std::error::Error for RegistryError {}

/// A `showScreen` action whose target isn't in the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DanglingLink {
    pub location: Location,
    pub target_id: String,
}

impl fmt::Display for DanglingLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} links to missing screen {:?}", self.location, self.target_id)
    }
}

#[derive(Debug)]
pub struct ScreenRegistry {
    screens: Vec<Arc<Screen>>,
    index: HashMap<String, usize>,
}

impl ScreenRegistry {
    pub fn build(app: Application) -> Result<ScreenRegistry, RegistryError> {
        let mut screens = Vec::with_capacity(app.screens.len());
        let mut index = HashMap::with_capacity(app.screens.len());

        for screen in app.screens {
            if index.contains_key(&screen.id) {
                return Err(RegistryError::DuplicateScreenId(screen.id));
            }
            index.insert(screen.id.clone(), screens.len());
            screens.push(Arc::new(screen));
        }

        debug!("Screen registry built: {} screens", screens.len());
        Ok(ScreenRegistry { screens, index })
    }

    pub fn lookup(&self, id: &str) -> Result<Arc<Screen>, RegistryError> {
        self.index
            .get(id)
            .map(|&i| Arc::clone(&self.screens[i]))
            .ok_or_else(|| RegistryError::UnknownScreen(id.to_string()))
    }

    /// First screen in document order.
    pub fn entry_screen(&self) -> Result<Arc<Screen>, RegistryError> {
        self.screens
            .first()
            .cloned()
            .ok_or(RegistryError::EmptyDocument)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.screens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.screens.is_empty()
    }

    /// Screens in document order.
    pub fn screens(&self) -> impl Iterator<Item = &Arc<Screen>> {
        self.screens.iter()
    }

    /// Every `showScreen` target that won't resolve at execution time.
    pub fn dangling_links(&self) -> Vec<DanglingLink> {
        self.screens
            .iter()
            .flat_map(|screen| screen.actions())
            .filter_map(|(location, action)| match action {
                Action::ShowScreen { target_id } if !self.contains(target_id) => {
                    Some(DanglingLink {
                        location,
                        target_id: target_id.clone(),
                    })
                }
                _ => None,
            })
            .collect()
    }
}
