//! Widget state definitions.

/// The UI state of a widget/shape.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum WidgetState {
    /// Normal display state - no interaction.
    #[default]
    Normal,
    /// Widget is selected (shows handles, can be moved/resized).
    Selected,
    /// Widget is in editing mode (e.g., text editing).
    Editing(EditingKind),
}

impl WidgetState {
    /// Check if widget is selected (either just selected or editing).
    pub fn is_selected(&self) -> bool {
        matches!(self, Self::Selected | Self::Editing(_))
    }

    /// Check if widget is in editing mode.
    pub fn is_editing(&self) -> bool {
        matches!(self, Self::Editing(_))
    }
}

/// Kind of editing mode.
#[derive(Debug, Clone, PartialEq)]
pub enum EditingKind {
    /// In-place text editing with the current character selection.
    Text { selection: TextRange },
}

/// Half-open range of character indices inside a text's content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TextRange {
    pub start: usize,
    pub end: usize,
}

impl TextRange {
    /// Collapsed caret at `index`.
    pub fn caret(index: usize) -> Self {
        Self {
            start: index,
            end: index,
        }
    }

    /// Range covering `len` characters from the start.
    pub fn all(len: usize) -> Self {
        Self { start: 0, end: len }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_editing_counts_as_selected() {
        let state = WidgetState::Editing(EditingKind::Text {
            selection: TextRange::caret(0),
        });
        assert!(state.is_selected());
        assert!(state.is_editing());
        assert!(!WidgetState::Normal.is_selected());
    }

    #[test]
    fn test_text_range() {
        assert_eq!(TextRange::all(5).len(), 5);
        assert!(TextRange::caret(3).is_empty());
    }
}
