//! Byte-stream decoder for terminal input.
//!
//! Turns raw stdin bytes, chunked arbitrarily, into key, mouse and scroll
//! events. Handles:
//! - printable ASCII and UTF-8 (multi-byte characters may span chunks)
//! - control bytes (Ctrl+letter, Enter, Tab, Backspace)
//! - Alt+key (`ESC` + byte)
//! - CSI and SS3 sequences (arrows, Home/End, Insert/Delete, PageUp/Down, F1-F12)
//! - SGR mouse reports (`ESC [ < b ; x ; y M|m`)
//!
//! A lone ESC is ambiguous until the next byte or the disambiguation
//! deadline. The decoder never reads the clock: callers pass `now` in and
//! call [`InputDecoder::expire`] once [`InputDecoder::deadline`] has passed.
//!
//! Nothing is ever dropped or rejected. Sequences that cannot be classified
//! come out as [`KeyCode::Unknown`] with their raw bytes.

use std::time::{Duration, Instant};

use tracing::trace;

use super::events::{
    INTERRUPT_BYTE, InputEvent, KeyCode, KeyEvent, Modifier, MouseAction, MouseButton, MouseEvent,
    ScrollDirection, ScrollEvent,
};
use crate::config::DecoderConfig;

const ESC: u8 = 0x1B;

/// Longest control or mouse sequence accepted before it is flushed verbatim.
const MAX_SEQUENCE: usize = 64;

/// Prefix removed when a CSI turns out to be an SGR mouse report.
const SGR_MOUSE_PREFIX: &[u8] = b"\x1b[<";

/// Where the decoder is inside a multi-byte unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecoderState {
    Normal,
    EscapeStarted,
    ControlSequence,
    MouseSequence,
}

/// Stateful input decoder. One per session.
#[derive(Debug)]
pub struct InputDecoder {
    state: DecoderState,
    /// Bytes of the unit in progress. In `MouseSequence` only the parameters.
    buf: Vec<u8>,
    /// Continuation bytes still expected for a UTF-8 character in `Normal`.
    utf8_pending: usize,
    /// The pending UTF-8 character was preceded by ESC.
    alt: bool,
    deadline: Option<Instant>,
    timeout: Duration,
}

impl InputDecoder {
    pub fn new(config: DecoderConfig) -> Self {
        Self {
            state: DecoderState::Normal,
            buf: Vec::with_capacity(MAX_SEQUENCE),
            utf8_pending: 0,
            alt: false,
            deadline: None,
            timeout: config.escape_timeout,
        }
    }

    pub fn state(&self) -> DecoderState {
        self.state
    }

    /// When the unit in progress must be resolved, if one is in progress.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Decode a chunk received at `now`.
    ///
    /// A unit whose deadline already passed is resolved first, so a late byte
    /// after a lone ESC is never mistaken for Alt+key.
    pub fn feed(&mut self, bytes: &[u8], now: Instant) -> Vec<InputEvent> {
        let mut out = Vec::new();
        self.expire_into(now, &mut out);
        for &b in bytes {
            self.push(b, now, &mut out);
        }
        out
    }

    /// Resolve the unit in progress if its deadline is at or before `now`.
    pub fn expire(&mut self, now: Instant) -> Vec<InputEvent> {
        let mut out = Vec::new();
        self.expire_into(now, &mut out);
        out
    }

    /// Resolve the unit in progress immediately.
    pub fn flush(&mut self) -> Vec<InputEvent> {
        let mut out = Vec::new();
        self.flush_into(&mut out);
        out
    }

    fn expire_into(&mut self, now: Instant, out: &mut Vec<InputEvent>) {
        if self.deadline.is_some_and(|d| d <= now) {
            self.flush_into(out);
        }
    }

    fn flush_into(&mut self, out: &mut Vec<InputEvent>) {
        match self.state {
            DecoderState::Normal if self.utf8_pending > 0 => self.emit_verbatim(out),
            DecoderState::Normal => {}
            DecoderState::EscapeStarted => {
                self.buf.clear();
                out.push(key(KeyCode::Escape, Modifier::empty(), vec![ESC]));
            }
            DecoderState::ControlSequence | DecoderState::MouseSequence => {
                self.emit_verbatim(out);
            }
        }
        self.reset();
    }

    fn reset(&mut self) {
        self.state = DecoderState::Normal;
        self.buf.clear();
        self.utf8_pending = 0;
        self.alt = false;
        self.deadline = None;
    }

    fn arm(&mut self, now: Instant) {
        self.deadline = Some(now + self.timeout);
    }

    fn push(&mut self, b: u8, now: Instant, out: &mut Vec<InputEvent>) {
        match self.state {
            DecoderState::Normal => self.push_normal(b, now, out),
            DecoderState::EscapeStarted => self.push_escape(b, now, out),
            DecoderState::ControlSequence => self.push_control(b, now, out),
            DecoderState::MouseSequence => self.push_mouse(b, now, out),
        }
    }

    fn push_normal(&mut self, b: u8, now: Instant, out: &mut Vec<InputEvent>) {
        if self.utf8_pending > 0 {
            if b & 0xC0 == 0x80 {
                self.buf.push(b);
                self.utf8_pending -= 1;
                if self.utf8_pending == 0 {
                    self.emit_utf8(out);
                }
                return;
            }
            // Truncated character: report what arrived, then treat `b` afresh.
            self.emit_verbatim(out);
            self.reset();
        }

        if b == ESC {
            self.buf.push(ESC);
            self.state = DecoderState::EscapeStarted;
            self.arm(now);
        } else if let Some(len) = utf8_len(b) {
            self.buf.push(b);
            self.utf8_pending = len - 1;
            self.arm(now);
        } else {
            out.push(InputEvent::Key(byte_key(b, Modifier::empty(), vec![b])));
        }
    }

    fn push_escape(&mut self, b: u8, now: Instant, out: &mut Vec<InputEvent>) {
        match b {
            b'[' | b'O' => {
                self.buf.push(b);
                self.state = DecoderState::ControlSequence;
                self.arm(now);
            }
            ESC => {
                self.reset();
                out.push(key(KeyCode::Escape, Modifier::ALT, vec![ESC, ESC]));
            }
            INTERRUPT_BYTE => {
                // Never folded into Alt+key: the interrupt must stay a bare byte.
                self.reset();
                out.push(key(KeyCode::Escape, Modifier::empty(), vec![ESC]));
                self.push_normal(b, now, out);
            }
            _ => {
                if let Some(len) = utf8_len(b) {
                    // The ESC is carried by `alt` and restored in the raw bytes on emit.
                    self.buf.clear();
                    self.buf.push(b);
                    self.state = DecoderState::Normal;
                    self.utf8_pending = len - 1;
                    self.alt = true;
                    self.arm(now);
                } else {
                    self.reset();
                    out.push(InputEvent::Key(byte_key(b, Modifier::ALT, vec![ESC, b])));
                }
            }
        }
    }

    fn push_control(&mut self, b: u8, now: Instant, out: &mut Vec<InputEvent>) {
        if b == b'<' && self.buf == b"\x1b[" {
            self.buf.clear();
            self.state = DecoderState::MouseSequence;
            self.arm(now);
            return;
        }

        if !(0x20..=0x7E).contains(&b) {
            // Control byte or new ESC mid-sequence: the partial sequence is
            // malformed, and `b` must still be decoded on its own (it may be
            // the interrupt).
            self.emit_verbatim(out);
            self.reset();
            self.push_normal(b, now, out);
            return;
        }

        self.buf.push(b);
        if (0x40..=0x7E).contains(&b) {
            let raw = std::mem::take(&mut self.buf);
            self.reset();
            out.push(InputEvent::Key(decode_sequence(raw)));
        } else if self.buf.len() >= MAX_SEQUENCE {
            self.emit_verbatim(out);
            self.reset();
        } else {
            self.arm(now);
        }
    }

    fn push_mouse(&mut self, b: u8, now: Instant, out: &mut Vec<InputEvent>) {
        match b {
            b'M' | b'm' => {
                let params = std::mem::take(&mut self.buf);
                self.reset();
                match decode_sgr_mouse(&params, b == b'm') {
                    Some(mouse) => {
                        out.push(InputEvent::Mouse(mouse));
                        if let Some(direction) = mouse.scroll {
                            out.push(InputEvent::Scroll(ScrollEvent {
                                direction,
                                x: mouse.x,
                                y: mouse.y,
                                modifiers: mouse.modifiers,
                            }));
                        }
                    }
                    None => {
                        let mut raw = SGR_MOUSE_PREFIX.to_vec();
                        raw.extend_from_slice(&params);
                        raw.push(b);
                        trace!(raw = ?String::from_utf8_lossy(&raw), "malformed mouse report");
                        out.push(key(KeyCode::Unknown, Modifier::empty(), raw));
                    }
                }
            }
            b'0'..=b'9' | b';' if self.buf.len() < MAX_SEQUENCE => {
                self.buf.push(b);
                self.arm(now);
            }
            0x20..=0x7E => {
                self.buf.push(b);
                self.emit_verbatim(out);
                self.reset();
            }
            _ => {
                self.emit_verbatim(out);
                self.reset();
                self.push_normal(b, now, out);
            }
        }
    }

    fn emit_utf8(&mut self, out: &mut Vec<InputEvent>) {
        let raw = std::mem::take(&mut self.buf);
        let alt = self.alt;
        self.reset();
        let ch = std::str::from_utf8(&raw[..]).ok().and_then(|s| s.chars().next());
        let modifiers = if alt { Modifier::ALT } else { Modifier::empty() };
        let mut full = raw;
        if alt {
            full.insert(0, ESC);
        }
        let code = match ch {
            Some(c) => KeyCode::Char(c),
            None => {
                trace!(raw = ?full, "invalid utf-8 input");
                KeyCode::Unknown
            }
        };
        out.push(key(code, modifiers, full));
    }

    /// Emit the unit in progress as an unrecognized key. Leaves state intact;
    /// callers reset.
    fn emit_verbatim(&mut self, out: &mut Vec<InputEvent>) {
        let mut raw = match self.state {
            DecoderState::MouseSequence => SGR_MOUSE_PREFIX.to_vec(),
            _ if self.alt => vec![ESC],
            _ => Vec::new(),
        };
        raw.append(&mut self.buf);
        if raw.is_empty() {
            return;
        }
        trace!(raw = ?String::from_utf8_lossy(&raw), "unrecognized input sequence");
        out.push(key(KeyCode::Unknown, Modifier::empty(), raw));
    }
}

impl Default for InputDecoder {
    fn default() -> Self {
        Self::new(DecoderConfig::default())
    }
}

// =============================================================================
// Helpers
// =============================================================================

fn key(code: KeyCode, modifiers: Modifier, raw: Vec<u8>) -> InputEvent {
    InputEvent::Key(KeyEvent::new(code, modifiers, raw))
}

/// Total length of a UTF-8 character from its lead byte, for multi-byte leads.
fn utf8_len(b: u8) -> Option<usize> {
    match b {
        0xC2..=0xDF => Some(2),
        0xE0..=0xEF => Some(3),
        0xF0..=0xF4 => Some(4),
        _ => None,
    }
}

/// Key for a single byte outside any sequence.
fn byte_key(b: u8, extra: Modifier, raw: Vec<u8>) -> KeyEvent {
    let (code, modifiers) = match b {
        0x00 => (KeyCode::Null, Modifier::CTRL),
        0x08 | 0x7F => (KeyCode::Backspace, Modifier::empty()),
        0x09 => (KeyCode::Tab, Modifier::empty()),
        0x0A | 0x0D => (KeyCode::Enter, Modifier::empty()),
        0x01..=0x1A => (KeyCode::Char((b - 1 + b'a') as char), Modifier::CTRL),
        0x1C..=0x1F => (KeyCode::Char((b + 0x40) as char), Modifier::CTRL),
        0x20..=0x7E => (KeyCode::Char(b as char), Modifier::empty()),
        _ => (KeyCode::Unknown, Modifier::empty()),
    };
    KeyEvent::new(code, modifiers | extra, raw)
}

/// Decode a complete `ESC [ ... final` or `ESC O final` sequence.
fn decode_sequence(raw: Vec<u8>) -> KeyEvent {
    let (code, modifiers) = match raw.get(1) {
        Some(b'O') => (ss3_key(raw[2]), Modifier::empty()),
        _ => csi_key(&raw),
    };
    if code == KeyCode::Unknown {
        trace!(raw = ?String::from_utf8_lossy(&raw), "unrecognized control sequence");
    }
    KeyEvent::new(code, modifiers, raw)
}

fn ss3_key(final_byte: u8) -> KeyCode {
    match final_byte {
        b'A' => KeyCode::Up,
        b'B' => KeyCode::Down,
        b'C' => KeyCode::Right,
        b'D' => KeyCode::Left,
        b'H' => KeyCode::Home,
        b'F' => KeyCode::End,
        b'P' => KeyCode::F(1),
        b'Q' => KeyCode::F(2),
        b'R' => KeyCode::F(3),
        b'S' => KeyCode::F(4),
        _ => KeyCode::Unknown,
    }
}

fn csi_key(raw: &[u8]) -> (KeyCode, Modifier) {
    let final_byte = raw[raw.len() - 1];
    let params = &raw[2..raw.len() - 1];
    // Private-marker and intermediate-byte sequences are replies, not keys.
    if params.iter().any(|b| !matches!(b, b'0'..=b'9' | b';')) {
        return (KeyCode::Unknown, Modifier::empty());
    }
    let params: Vec<u32> = std::str::from_utf8(params)
        .unwrap_or_default()
        .split(';')
        .map(|p| p.parse().unwrap_or(0))
        .collect();
    let modifiers = params.get(1).map_or(Modifier::empty(), |&m| decode_modifier(m));

    let code = match final_byte {
        b'A' => KeyCode::Up,
        b'B' => KeyCode::Down,
        b'C' => KeyCode::Right,
        b'D' => KeyCode::Left,
        b'H' => KeyCode::Home,
        b'F' => KeyCode::End,
        b'P' => KeyCode::F(1),
        b'Q' => KeyCode::F(2),
        b'R' => KeyCode::F(3),
        b'S' => KeyCode::F(4),
        b'Z' => return (KeyCode::Tab, Modifier::SHIFT),
        b'u' => return kitty_key(&params),
        b'~' => match params.first().copied().unwrap_or(0) {
            1 | 7 => KeyCode::Home,
            2 => KeyCode::Insert,
            3 => KeyCode::Delete,
            4 | 8 => KeyCode::End,
            5 => KeyCode::PageUp,
            6 => KeyCode::PageDown,
            15 => KeyCode::F(5),
            17 => KeyCode::F(6),
            18 => KeyCode::F(7),
            19 => KeyCode::F(8),
            20 => KeyCode::F(9),
            21 => KeyCode::F(10),
            23 => KeyCode::F(11),
            24 => KeyCode::F(12),
            _ => KeyCode::Unknown,
        },
        _ => KeyCode::Unknown,
    };
    if code == KeyCode::Unknown {
        return (code, Modifier::empty());
    }
    (code, modifiers)
}

/// `CSI codepoint ; modifiers u` (kitty keyboard protocol).
fn kitty_key(params: &[u32]) -> (KeyCode, Modifier) {
    let modifiers = params.get(1).map_or(Modifier::empty(), |&m| decode_modifier(m));
    let code = match params.first().copied().unwrap_or(0) {
        9 => KeyCode::Tab,
        13 => KeyCode::Enter,
        27 => KeyCode::Escape,
        127 => KeyCode::Backspace,
        cp => char::from_u32(cp).map_or(KeyCode::Unknown, KeyCode::Char),
    };
    (code, modifiers)
}

/// CSI modifier parameter: 1 + bitmask of shift/alt/ctrl/super.
fn decode_modifier(param: u32) -> Modifier {
    let bits = param.saturating_sub(1);
    let mut m = Modifier::empty();
    if bits & 1 != 0 {
        m |= Modifier::SHIFT;
    }
    if bits & 2 != 0 {
        m |= Modifier::ALT;
    }
    if bits & 4 != 0 {
        m |= Modifier::CTRL;
    }
    if bits & 8 != 0 {
        m |= Modifier::SUPER;
    }
    m
}

/// Parse the `button;x;y` body of an SGR mouse report.
fn decode_sgr_mouse(params: &[u8], release: bool) -> Option<MouseEvent> {
    let text = std::str::from_utf8(params).ok()?;
    let mut fields = text.split(';').map(|f| f.parse::<u16>().ok());
    let (code, x, y) = (fields.next()??, fields.next()??, fields.next()??);
    if fields.next().is_some() {
        return None;
    }

    let mut modifiers = Modifier::empty();
    if code & 4 != 0 {
        modifiers |= Modifier::SHIFT;
    }
    if code & 8 != 0 {
        modifiers |= Modifier::ALT;
    }
    if code & 16 != 0 {
        modifiers |= Modifier::CTRL;
    }

    let base = code & !(4 | 8 | 16);
    let scroll = match base {
        64 => Some(ScrollDirection::Up),
        65 => Some(ScrollDirection::Down),
        66 => Some(ScrollDirection::Left),
        67 => Some(ScrollDirection::Right),
        _ => None,
    };

    let (button, action) = if scroll.is_some() {
        (MouseButton::None, MouseAction::Scroll)
    } else if base & 32 != 0 {
        (MouseButton::from_code(base), MouseAction::Move)
    } else if release {
        (MouseButton::from_code(base), MouseAction::Release)
    } else {
        (MouseButton::from_code(base), MouseAction::Press)
    };

    Some(MouseEvent {
        x,
        y,
        button,
        action,
        scroll,
        modifiers,
    })
}

// =============================================================================
// Tests
// =============================================================================
