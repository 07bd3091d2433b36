//! Publish/subscribe hub for editor events.
//!
//! Controllers and external consumers talk through [`EditorEvent`]s instead
//! of calling each other directly.

use crate::state::ContextMenuRequest;
use kurbo::Size;
use plutis_core::{SerializableColor, ShapeId};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use uuid::Uuid;

/// Everything the editor announces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EditorEvent {
    FrameResized { size: Size },
    BackgroundChanged { color: SerializableColor },
    ZoomChanged { ratio: f64 },
    HistoryChanged { can_undo: bool, can_redo: bool },
    ObjectsChanged,
    SelectionChanged { ids: Vec<ShapeId> },
    SceneLoaded { layers: usize },
    Rendered { generation: u64 },
    AttributesChanged { id: ShapeId },
    GuidelinesChanged { count: usize },
    ContextMenuRequested(ContextMenuRequest),
    /// A group was flattened so one of its texts can be edited in place.
    GroupDissolved { group_id: ShapeId, text_id: ShapeId },
    EditingStarted { text_id: ShapeId },
    /// The members of a dissolved group were grouped again.
    GroupReformed { group_id: ShapeId, members: Vec<ShapeId> },
    EditCancelled { text_id: ShapeId },
}

/// Event category for filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventCategory {
    Frame,
    Zoom,
    History,
    Objects,
    Selection,
    Scene,
    Render,
    Personalization,
    Guidelines,
    ContextMenu,
    GroupEdit,
}

impl EditorEvent {
    pub fn category(&self) -> EventCategory {
        match self {
            EditorEvent::FrameResized { .. } | EditorEvent::BackgroundChanged { .. } => {
                EventCategory::Frame
            }
            EditorEvent::ZoomChanged { .. } => EventCategory::Zoom,
            EditorEvent::HistoryChanged { .. } => EventCategory::History,
            EditorEvent::ObjectsChanged => EventCategory::Objects,
            EditorEvent::SelectionChanged { .. } => EventCategory::Selection,
            EditorEvent::SceneLoaded { .. } => EventCategory::Scene,
            EditorEvent::Rendered { .. } => EventCategory::Render,
            EditorEvent::AttributesChanged { .. } => EventCategory::Personalization,
            EditorEvent::GuidelinesChanged { .. } => EventCategory::Guidelines,
            EditorEvent::ContextMenuRequested(_) => EventCategory::ContextMenu,
            EditorEvent::GroupDissolved { .. }
            | EditorEvent::EditingStarted { .. }
            | EditorEvent::GroupReformed { .. }
            | EditorEvent::EditCancelled { .. } => EventCategory::GroupEdit,
        }
    }

    /// Short name used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            EditorEvent::FrameResized { .. } => "frame:resized",
            EditorEvent::BackgroundChanged { .. } => "frame:background",
            EditorEvent::ZoomChanged { .. } => "zoom:changed",
            EditorEvent::HistoryChanged { .. } => "history:changed",
            EditorEvent::ObjectsChanged => "objects:changed",
            EditorEvent::SelectionChanged { .. } => "selection:changed",
            EditorEvent::SceneLoaded { .. } => "scene:loaded",
            EditorEvent::Rendered { .. } => "render:done",
            EditorEvent::AttributesChanged { .. } => "attributes:changed",
            EditorEvent::GuidelinesChanged { .. } => "guidelines:changed",
            EditorEvent::ContextMenuRequested(_) => "contextmenu:requested",
            EditorEvent::GroupDissolved { .. } => "group:dissolved",
            EditorEvent::EditingStarted { .. } => "editing:started",
            EditorEvent::GroupReformed { .. } => "group:reformed",
            EditorEvent::EditCancelled { .. } => "editing:cancelled",
        }
    }
}

/// Subscription handle for unsubscribing from events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(Uuid);

impl SubscriptionId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Sub({})", &self.0.simple().to_string()[..8])
    }
}

/// Filter to receive only specific event types.
#[derive(Debug, Clone, Default)]
pub enum EventFilter {
    #[default]
    All,
    Categories(Vec<EventCategory>),
}

impl EventFilter {
    pub fn category(category: EventCategory) -> Self {
        EventFilter::Categories(vec![category])
    }

    pub fn matches(&self, event: &EditorEvent) -> bool {
        match self {
            EventFilter::All => true,
            EventFilter::Categories(categories) => categories.contains(&event.category()),
        }
    }
}

type EventHandler = Rc<dyn Fn(&EditorEvent)>;

/// Single-threaded event hub. Handlers run in subscription order.
#[derive(Default)]
pub struct EventManager {
    handlers: RefCell<Vec<(SubscriptionId, EventFilter, EventHandler)>>,
}

impl fmt::Debug for EventManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventManager")
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

impl EventManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler for events matching `filter`.
    pub fn subscribe<F>(&self, filter: EventFilter, handler: F) -> SubscriptionId
    where
        F: Fn(&EditorEvent) + 'static,
    {
        let id = SubscriptionId::new();
        self.handlers.borrow_mut().push((id, filter, Rc::new(handler)));
        log::debug!("Subscription {} added", id);
        id
    }

    /// Returns true if the subscription was found and removed.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut handlers = self.handlers.borrow_mut();
        let before = handlers.len();
        handlers.retain(|(sub, _, _)| *sub != id);
        let removed = handlers.len() != before;
        if removed {
            log::debug!("Subscription {} removed", id);
        }
        removed
    }

    /// Deliver an event; returns how many handlers saw it.
    ///
    /// The handler list is copied first, so handlers may subscribe,
    /// unsubscribe or publish while being called.
    pub fn publish(&self, event: &EditorEvent) -> usize {
        let matching: Vec<EventHandler> = self
            .handlers
            .borrow()
            .iter()
            .filter(|(_, filter, _)| filter.matches(event))
            .map(|(_, _, handler)| Rc::clone(handler))
            .collect();
        log::trace!("Publishing {} to {} handler(s)", event.name(), matching.len());
        for handler in &matching {
            handler(event);
        }
        matching.len()
    }

    pub fn subscriber_count(&self) -> usize {
        self.handlers.borrow().len()
    }

    pub fn clear(&self) {
        self.handlers.borrow_mut().clear();
    }
}
