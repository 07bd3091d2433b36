//! Pointer and keyboard event payloads, plus double-click detection.

use kurbo::Point;
use serde::{Deserialize, Serialize};
use std::time::Duration;

// Use web_time for WASM compatibility
#[cfg(not(target_arch = "wasm32"))]
use std::time::Instant;
#[cfg(target_arch = "wasm32")]
use web_time::Instant;

/// Mouse button identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum MouseButton {
    #[default]
    Left,
    Right,
    Middle,
}

/// Modifier keys state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

impl Modifiers {
    pub const NONE: Self = Self {
        shift: false,
        ctrl: false,
        alt: false,
        meta: false,
    };

    /// Platform command key (Ctrl or Cmd).
    pub fn command(&self) -> bool {
        self.ctrl || self.meta
    }
}

/// A raw pointer event as delivered by the host, in screen coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointerInput {
    pub position: Point,
    pub button: MouseButton,
    #[serde(default)]
    pub modifiers: Modifiers,
}

impl PointerInput {
    /// Left-button event without modifiers.
    pub fn left(position: Point) -> Self {
        Self {
            position,
            button: MouseButton::Left,
            modifiers: Modifiers::NONE,
        }
    }

    pub fn with_button(mut self, button: MouseButton) -> Self {
        self.button = button;
        self
    }

    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }
}

/// Keys the editor reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Key {
    Escape,
    Delete,
    Backspace,
    Enter,
    Character(char),
}

impl Key {
    /// Whether this is the given letter, ignoring case.
    pub fn is_char(&self, expected: char) -> bool {
        matches!(self, Key::Character(c) if c.eq_ignore_ascii_case(&expected))
    }
}

/// Keyboard event type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyEvent {
    pub key: Key,
    #[serde(default)]
    pub modifiers: Modifiers,
}

impl KeyEvent {
    pub fn new(key: Key) -> Self {
        Self {
            key,
            modifiers: Modifiers::NONE,
        }
    }

    /// Same key with the command modifier held.
    pub fn command(key: Key) -> Self {
        Self {
            key,
            modifiers: Modifiers {
                ctrl: true,
                ..Modifiers::NONE
            },
        }
    }
}

/// Double-click detection constants.
const DOUBLE_CLICK_TIME: Duration = Duration::from_millis(500);
const DOUBLE_CLICK_DISTANCE: f64 = 5.0;

/// Detects double-clicks from a stream of left-button presses.
#[derive(Debug, Clone, Default)]
pub struct ClickTracker {
    last_click: Option<(Instant, Point)>,
}

impl ClickTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a press now. Returns true if it completes a double-click.
    pub fn click(&mut self, position: Point) -> bool {
        self.click_at(position, Instant::now())
    }

    /// Register a press at an explicit time.
    pub fn click_at(&mut self, position: Point, now: Instant) -> bool {
        if let Some((last_time, last_pos)) = self.last_click {
            let elapsed = now.saturating_duration_since(last_time);
            if elapsed < DOUBLE_CLICK_TIME && position.distance(last_pos) < DOUBLE_CLICK_DISTANCE {
                // Reset so a triple click is not reported as a second double-click
                self.last_click = None;
                return true;
            }
        }
        self.last_click = Some((now, position));
        false
    }

    pub fn reset(&mut self) {
        self.last_click = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_double_click_detection() {
        let mut tracker = ClickTracker::new();
        let pos = Point::new(100.0, 100.0);
        let start = Instant::now();

        assert!(!tracker.click_at(pos, start));
        assert!(tracker.click_at(pos, start + Duration::from_millis(200)));
        // Third click starts a new sequence
        assert!(!tracker.click_at(pos, start + Duration::from_millis(300)));
    }

    #[test]
    fn test_double_click_too_far() {
        let mut tracker = ClickTracker::new();
        let start = Instant::now();

        tracker.click_at(Point::new(100.0, 100.0), start);
        assert!(!tracker.click_at(Point::new(200.0, 200.0), start + Duration::from_millis(50)));
    }

    #[test]
    fn test_double_click_too_slow() {
        let mut tracker = ClickTracker::new();
        let pos = Point::new(10.0, 10.0);
        let start = Instant::now();

        tracker.click_at(pos, start);
        assert!(!tracker.click_at(pos, start + Duration::from_millis(800)));
    }

    #[test]
    fn test_key_helpers() {
        let event = KeyEvent::command(Key::Character('Z'));
        assert!(event.modifiers.command());
        assert!(event.key.is_char('z'));
        assert!(!KeyEvent::new(Key::Escape).modifiers.command());
    }
}
