//! Widget system for managing interactive shape states.
//!
//! This module provides a unified way to manage UI state for shapes:
//! - Selection state with handles
//! - Editing state (in-place text editing)
//! - Selectability (locked shapes are skipped by pointer targeting)
//!
//! Shapes remain pure data. Widgets wrap shapes with UI state.

mod handles;
mod manager;
mod state;

pub use handles::{Handle, HandleKind};
pub use manager::WidgetManager;
pub use state::{EditingKind, TextRange, WidgetState};
