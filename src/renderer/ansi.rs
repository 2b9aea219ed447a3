//! Control sequences written by the renderer and the session.
//!
//! Only what an inline prompt needs: relative cursor motion, line and
//! screen-tail erasure, cursor visibility, SGR mouse tracking and
//! synchronized output.

use std::io::{Result, Write};

/// Line break used between frame lines. Raw mode disables output
/// post-processing, so LF alone would not return the carriage.
pub const LINE_BREAK: &str = "\r\n";

// =============================================================================
// Cursor
// =============================================================================

/// Move cursor up by n rows. No-op for 0.
#[inline]
pub fn cursor_up<W: Write>(w: &mut W, n: usize) -> Result<()> {
    if n > 0 { write!(w, "\x1b[{n}A") } else { Ok(()) }
}

/// Move cursor down by n rows. No-op for 0.
#[inline]
pub fn cursor_down<W: Write>(w: &mut W, n: usize) -> Result<()> {
    if n > 0 { write!(w, "\x1b[{n}B") } else { Ok(()) }
}

#[inline]
pub fn cursor_column_zero<W: Write>(w: &mut W) -> Result<()> {
    w.write_all(b"\x1b[G")
}

#[inline]
pub fn cursor_hide<W: Write>(w: &mut W) -> Result<()> {
    w.write_all(b"\x1b[?25l")
}

#[inline]
pub fn cursor_show<W: Write>(w: &mut W) -> Result<()> {
    w.write_all(b"\x1b[?25h")
}

// =============================================================================
// Erasure
// =============================================================================

/// Clear the entire current line. The cursor does not move.
#[inline]
pub fn erase_line<W: Write>(w: &mut W) -> Result<()> {
    w.write_all(b"\x1b[2K")
}

/// Clear from the cursor to the end of the screen.
#[inline]
pub fn erase_down<W: Write>(w: &mut W) -> Result<()> {
    w.write_all(b"\x1b[J")
}

/// Reset all SGR attributes.
#[inline]
pub fn reset<W: Write>(w: &mut W) -> Result<()> {
    w.write_all(b"\x1b[0m")
}

// =============================================================================
// Synchronized Output
// =============================================================================

#[inline]
pub fn begin_sync<W: Write>(w: &mut W) -> Result<()> {
    w.write_all(b"\x1b[?2026h")
}

#[inline]
pub fn end_sync<W: Write>(w: &mut W) -> Result<()> {
    w.write_all(b"\x1b[?2026l")
}

// =============================================================================
// Mouse
// =============================================================================

/// Button, drag and SGR extended reporting.
#[inline]
pub fn enable_mouse<W: Write>(w: &mut W) -> Result<()> {
    w.write_all(b"\x1b[?1000h\x1b[?1002h\x1b[?1006h")
}

#[inline]
pub fn disable_mouse<W: Write>(w: &mut W) -> Result<()> {
    w.write_all(b"\x1b[?1006l\x1b[?1002l\x1b[?1000l")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn emit(f: impl FnOnce(&mut Vec<u8>) -> Result<()>) -> String {
        let mut out = Vec::new();
        f(&mut out).expect("write to vec");
        String::from_utf8(out).expect("ascii")
    }

    #[test]
    fn relative_motion() {
        assert_eq!(emit(|w| cursor_up(w, 3)), "\x1b[3A");
        assert_eq!(emit(|w| cursor_down(w, 12)), "\x1b[12B");
        assert_eq!(emit(|w| cursor_up(w, 0)), "");
        assert_eq!(emit(|w| cursor_down(w, 0)), "");
    }

    #[test]
    fn mouse_toggles_mirror_each_other() {
        assert_eq!(emit(enable_mouse), "\x1b[?1000h\x1b[?1002h\x1b[?1006h");
        assert_eq!(emit(disable_mouse), "\x1b[?1006l\x1b[?1002l\x1b[?1000l");
    }
}
