//! Plutis Editor Library
//!
//! Editor orchestration for the Plutis design editor: the canvas wrapper,
//! one controller per editing concern, the event hub, and in-place editing of
//! text that sits inside a group.

pub mod canvas;
pub mod config;
pub mod controllers;
pub mod editor;
pub mod error;
pub mod events;
pub mod group_edit;
pub mod state;

pub use canvas::{Canvas, ListenerId, NativeEvent, NativeEventKind, SurfaceHandle};
pub use config::{EditorConfig, PartialEditorConfig};
pub use controllers::ControllerOptions;
pub use editor::{Editor, EditorOptions};
pub use error::{EditorError, Result};
pub use events::{EditorEvent, EventCategory, EventFilter, EventManager, SubscriptionId};
pub use group_edit::{EditCompletion, EditExit, EditPhase, EditSession, GroupEditor};
pub use state::{ContextMenuRequest, EditorState, SharedState};
