//! Decoded input events.
//!
//! Events are ephemeral: the decoder emits each one exactly once and the
//! session hands it to the widget by reference.

/// One decoded unit of input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputEvent {
    Key(KeyEvent),
    Mouse(MouseEvent),
    /// Convenience signal emitted right after the `Mouse` event of a wheel turn.
    Scroll(ScrollEvent),
}

/// A key press.
///
/// `raw` holds the exact bytes that produced the event, so unrecognized
/// sequences can still be forwarded verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyEvent {
    pub code: KeyCode,
    pub modifiers: Modifier,
    pub raw: Vec<u8>,
}

/// Normalized key identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCode {
    Char(char),
    /// Both CR and LF arrive as `Enter`.
    Enter,
    Tab,
    Backspace,
    Escape,
    Delete,
    Up,
    Down,
    Left,
    Right,
    Home,
    End,
    PageUp,
    PageDown,
    Insert,
    F(u8),
    Null,
    /// A sequence the decoder does not recognize; see [`KeyEvent::raw`].
    Unknown,
}

bitflags::bitflags! {
    /// Keyboard and mouse modifiers. `ALT` doubles as the mouse "meta" bit.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Modifier: u8 {
        const SHIFT = 1 << 0;
        const ALT   = 1 << 1;
        const CTRL  = 1 << 2;
        const SUPER = 1 << 3;
    }
}

/// The byte a terminal sends for Ctrl+C in raw mode.
pub const INTERRUPT_BYTE: u8 = 0x03;

impl KeyEvent {
    pub fn new(code: KeyCode, modifiers: Modifier, raw: impl Into<Vec<u8>>) -> Self {
        Self {
            code,
            modifiers,
            raw: raw.into(),
        }
    }

    /// The text this key would insert, if any.
    ///
    /// CR is reported as `'\n'`. Keys chorded with Ctrl or Alt insert nothing.
    pub fn char(&self) -> Option<char> {
        if self.modifiers.intersects(Modifier::CTRL | Modifier::ALT) {
            return None;
        }
        match self.code {
            KeyCode::Char(c) => Some(c),
            KeyCode::Enter => Some('\n'),
            KeyCode::Tab => Some('\t'),
            _ => None,
        }
    }

    /// Whether this is the global interrupt (a bare ETX byte).
    pub fn is_interrupt(&self) -> bool {
        self.raw == [INTERRUPT_BYTE]
    }

    /// Plain key without modifiers.
    pub fn is(&self, code: KeyCode) -> bool {
        self.code == code && self.modifiers.is_empty()
    }
}

/// Mouse button from the low two bits of an SGR button code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MouseButton {
    Left,
    Middle,
    Right,
    #[default]
    None,
}

impl MouseButton {
    pub(crate) fn from_code(code: u16) -> Self {
        match code & 0b11 {
            0 => Self::Left,
            1 => Self::Middle,
            2 => Self::Right,
            _ => Self::None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseAction {
    Press,
    Release,
    Move,
    Scroll,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollDirection {
    Up,
    Down,
    Left,
    Right,
}

/// A mouse report. Coordinates are 1-based, exactly as the terminal sent them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MouseEvent {
    pub x: u16,
    pub y: u16,
    pub button: MouseButton,
    pub action: MouseAction,
    /// Set only when `action` is `Scroll`.
    pub scroll: Option<ScrollDirection>,
    pub modifiers: Modifier,
}

impl MouseEvent {
    pub fn shift(&self) -> bool {
        self.modifiers.contains(Modifier::SHIFT)
    }

    pub fn ctrl(&self) -> bool {
        self.modifiers.contains(Modifier::CTRL)
    }

    pub fn meta(&self) -> bool {
        self.modifiers.contains(Modifier::ALT)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScrollEvent {
    pub direction: ScrollDirection,
    pub x: u16,
    pub y: u16,
    pub modifiers: Modifier,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enter_inserts_newline() {
        let key = KeyEvent::new(KeyCode::Enter, Modifier::empty(), b"\r".to_vec());
        assert_eq!(key.char(), Some('\n'));
    }

    #[test]
    fn chorded_keys_insert_nothing() {
        let key = KeyEvent::new(KeyCode::Char('a'), Modifier::ALT, b"\x1ba".to_vec());
        assert_eq!(key.char(), None);
        assert!(!key.is(KeyCode::Char('a')));
    }

    #[test]
    fn interrupt_is_the_raw_byte() {
        let ctrl_c = KeyEvent::new(KeyCode::Char('c'), Modifier::CTRL, vec![INTERRUPT_BYTE]);
        assert!(ctrl_c.is_interrupt());
        let kitty = KeyEvent::new(KeyCode::Char('c'), Modifier::CTRL, b"\x1b[99;5u".to_vec());
        assert!(!kitty.is_interrupt());
    }

    #[test]
    fn button_bits() {
        assert_eq!(MouseButton::from_code(0), MouseButton::Left);
        assert_eq!(MouseButton::from_code(1), MouseButton::Middle);
        assert_eq!(MouseButton::from_code(2 | 32), MouseButton::Right);
        assert_eq!(MouseButton::from_code(3), MouseButton::None);
    }
}
