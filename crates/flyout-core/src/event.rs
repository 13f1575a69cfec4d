#![forbid(unsafe_code)]

//! Canonical input/event types.
//!
//! Events derive `Clone` and `PartialEq` for use in tests and pattern
//! matching.
//!
//! # Design Notes
//!
//! - Pointer coordinates are viewport ("client") coordinates, not document
//!   coordinates; scroll offset is applied by whoever places overlays.
//! - `KeyEventKind` defaults to `Press`.
//! - `Modifiers` use bitflags for easy combination.

use bitflags::bitflags;

/// Canonical input event.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// A keyboard event.
    Key(KeyEvent),

    /// A pointer (mouse/pen) event.
    Pointer(PointerEvent),

    /// The viewport was resized.
    Resize {
        /// New viewport width.
        width: f32,
        /// New viewport height.
        height: f32,
    },

    /// The document was scrolled to a new offset.
    Scroll {
        x: f32,
        y: f32,
    },

    /// Frame tick. Deferred post-layout work runs here.
    Tick,
}

/// A keyboard event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    /// The key code that was pressed.
    pub code: KeyCode,

    /// Modifier keys held during the event.
    pub modifiers: Modifiers,

    /// The type of key event (press, repeat, or release).
    pub kind: KeyEventKind,
}

impl KeyEvent {
    /// Create a new key event with default modifiers and Press kind.
    #[must_use]
    pub const fn new(code: KeyCode) -> Self {
        Self {
            code,
            modifiers: Modifiers::NONE,
            kind: KeyEventKind::Press,
        }
    }

    /// Create a key event with modifiers.
    #[must_use]
    pub const fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    /// Create a key event with a specific kind.
    #[must_use]
    pub const fn with_kind(mut self, kind: KeyEventKind) -> Self {
        self.kind = kind;
        self
    }

    /// Check if this is a specific character key.
    #[must_use]
    pub fn is_char(&self, c: char) -> bool {
        matches!(self.code, KeyCode::Char(ch) if ch == c)
    }

    /// Enter or Space: the keys that activate a focused row.
    #[must_use]
    pub fn is_activation(&self) -> bool {
        self.code == KeyCode::Enter || self.is_char(' ')
    }
}

/// Key codes for keyboard events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCode {
    /// A regular character key.
    Char(char),
    Enter,
    Escape,
    Backspace,
    Tab,
    BackTab,
    Home,
    End,
    Up,
    Down,
    Left,
    Right,
}

/// The type of key event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum KeyEventKind {
    /// Key was pressed (default when not distinguishable).
    #[default]
    Press,

    /// Key is being held (repeat event).
    Repeat,

    /// Key was released.
    Release,
}

bitflags! {
    /// Modifier keys that can be held during an input event.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Modifiers: u8 {
        /// No modifiers.
        const NONE  = 0b0000;
        /// Shift key.
        const SHIFT = 0b0001;
        /// Alt/Option key.
        const ALT   = 0b0010;
        /// Control key.
        const CTRL  = 0b0100;
        /// Super/Meta/Command key.
        const SUPER = 0b1000;
    }
}

impl Default for Modifiers {
    fn default() -> Self {
        Self::NONE
    }
}

/// A pointer event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerEvent {
    /// The type of pointer event.
    pub kind: PointerEventKind,

    /// Viewport x coordinate.
    pub x: f32,

    /// Viewport y coordinate.
    pub y: f32,

    /// Modifier keys held during the event.
    pub modifiers: Modifiers,
}

impl PointerEvent {
    /// Create a new pointer event.
    #[must_use]
    pub const fn new(kind: PointerEventKind, x: f32, y: f32) -> Self {
        Self {
            kind,
            x,
            y,
            modifiers: Modifiers::NONE,
        }
    }

    /// Primary-button press at `(x, y)`.
    #[must_use]
    pub const fn down(x: f32, y: f32) -> Self {
        Self::new(PointerEventKind::Down(PointerButton::Primary), x, y)
    }

    /// Primary-button release at `(x, y)`.
    #[must_use]
    pub const fn up(x: f32, y: f32) -> Self {
        Self::new(PointerEventKind::Up(PointerButton::Primary), x, y)
    }

    /// Pointer motion to `(x, y)`.
    #[must_use]
    pub const fn moved(x: f32, y: f32) -> Self {
        Self::new(PointerEventKind::Moved, x, y)
    }

    /// Create a pointer event with modifiers.
    #[must_use]
    pub const fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    /// Get the position as a tuple.
    #[must_use]
    pub const fn position(&self) -> (f32, f32) {
        (self.x, self.y)
    }
}

/// The type of pointer event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerEventKind {
    /// Button pressed down.
    Down(PointerButton),

    /// Button released. A release over the same row as the press is a click.
    Up(PointerButton),

    /// Pointer moved (hover).
    Moved,
}

/// Pointer buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PointerButton {
    Primary,
    Secondary,
    Middle,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_event_defaults_to_press() {
        let ev = KeyEvent::new(KeyCode::Enter);
        assert_eq!(ev.kind, KeyEventKind::Press);
        assert_eq!(ev.modifiers, Modifiers::NONE);
    }

    #[test]
    fn activation_keys() {
        assert!(KeyEvent::new(KeyCode::Enter).is_activation());
        assert!(KeyEvent::new(KeyCode::Char(' ')).is_activation());
        assert!(!KeyEvent::new(KeyCode::Char('a')).is_activation());
        assert!(!KeyEvent::new(KeyCode::Escape).is_activation());
    }

    #[test]
    fn key_kind_and_char_match() {
        let release = KeyEvent::new(KeyCode::Char('q')).with_kind(KeyEventKind::Release);
        assert_eq!(release.kind, KeyEventKind::Release);
        assert!(release.is_char('q'));
        assert!(!release.is_char('Q'));
        assert!(!KeyEvent::new(KeyCode::Enter).is_char('\n'));
    }

    #[test]
    fn pointer_constructors() {
        let down = PointerEvent::down(3.0, 4.0);
        assert_eq!(down.kind, PointerEventKind::Down(PointerButton::Primary));
        assert_eq!(down.position(), (3.0, 4.0));
        let up = PointerEvent::up(1.0, 2.0).with_modifiers(Modifiers::SHIFT);
        assert_eq!(up.kind, PointerEventKind::Up(PointerButton::Primary));
        assert!(up.modifiers.contains(Modifiers::SHIFT));
    }

    #[test]
    fn modifiers_combine() {
        let mods = Modifiers::CTRL | Modifiers::ALT;
        assert!(mods.contains(Modifiers::CTRL));
        assert!(!mods.contains(Modifiers::SUPER));
        assert_eq!(Modifiers::default(), Modifiers::NONE);
    }
}
