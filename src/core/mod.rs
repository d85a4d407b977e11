//! # Core Navigation Logic
//!
//! This module contains Waypoint's business logic.
//! It knows nothing about any specific UI technology.
//!
//! ```text
//!                    ┌─────────────────────────┐
//!                    │         CORE            │
//!                    │  (this module)          │
//!                    │                         │
//!                    │  • Action (vocabulary)  │
//!                    │  • Screen (document)    │
//!                    │  • Registry (by id)     │
//!                    │  • Engine (execute)     │
//!                    │                         │
//!                    │  No drawing. No globals.│
//!                    └───────────┬─────────────┘
//!                                │ PresentationPort
//!            ┌───────────────────┼───────────────────┐
//!            ▼                   ▼                   ▼
//!     ┌────────────┐      ┌────────────┐      ┌────────────┐
//!     │  Console   │      │   Tests    │      │   Mobile   │
//!     │  Adapter   │      │ (recorder) │      │  (future)  │
//!     └────────────┘      └────────────┘      └────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`action`]: The `Action` enum and its tag/payload decoder
//! - [`screen`]: `Application`, `Screen`, `Row`, `Button` and document parsing
//! - [`registry`]: Screens indexed by id
//! - [`engine`]: `NavigationEngine::execute`, the action → effect state machine
//! - [`port`]: The `PresentationPort` trait the host implements
//! - [`session`]: One loaded document, from fetch to engine
//! - [`config`]: Settings and their override hierarchy

pub mod action;
pub mod config;
pub mod engine;
pub mod port;
pub mod registry;
pub mod screen;
pub mod session;

// Re-export commonly used types for convenience
pub use action::{Action, ActionError, ActionKind};
pub use engine::{Dispatch, EngineState, NavigationEngine, NavigationError};
pub use port::{PresentationPort, ShareItem};
pub use registry::{RegistryError, ScreenRegistry};
pub use screen::{Application, Button, DocumentError, Row, Screen};
pub use session::{LoadError, LoadOptions, Session};
