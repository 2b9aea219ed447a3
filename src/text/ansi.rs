//! Escape sequence stripping.
//!
//! Prompt frames are plain strings with embedded style codes. Anything that
//! starts with ESC is invisible to the user and must be skipped when measuring
//! or truncating. Recognized shapes:
//! - CSI: `ESC [` params, final byte (0x40-0x7E)
//! - OSC: `ESC ]` ... BEL or ST (`ESC \`)
//! - DCS/PM/APC: `ESC P` / `ESC ^` / `ESC _` ... ST
//! - two-byte: `ESC` + one char

use std::borrow::Cow;

const ESC: u8 = 0x1B;

/// Remove every escape sequence from `s`, leaving only visible text.
///
/// Borrows when `s` contains no ESC byte.
pub fn strip_ansi(s: &str) -> Cow<'_, str> {
    if !s.as_bytes().contains(&ESC) {
        return Cow::Borrowed(s);
    }

    let bytes = s.as_bytes();
    let mut out = String::with_capacity(s.len());
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] == ESC {
            i += escape_len(bytes, i);
            continue;
        }
        // ESC is ASCII, so slicing between ESC positions stays on char boundaries.
        let start = i;
        while i < bytes.len() && bytes[i] != ESC {
            i += 1;
        }
        out.push_str(&s[start..i]);
    }

    Cow::Owned(out)
}

/// Byte length of the escape sequence starting at `pos` (which must hold ESC).
///
/// Unterminated sequences run to the end of the input. The result is always at
/// least 1 and always lands on a char boundary of a valid UTF-8 string.
pub(crate) fn escape_len(bytes: &[u8], pos: usize) -> usize {
    debug_assert_eq!(bytes.get(pos), Some(&ESC));
    let Some(&kind) = bytes.get(pos + 1) else {
        return 1;
    };

    let end = match kind {
        b'[' => csi_end(bytes, pos + 2),
        b']' | b'P' | b'^' | b'_' => string_end(bytes, pos + 2),
        // Two-byte form; a non-ASCII follower is left alone as visible text.
        0x20..=0x7E => pos + 2,
        _ => pos + 1,
    };
    end - pos
}

fn csi_end(bytes: &[u8], from: usize) -> usize {
    for (i, &b) in bytes.iter().enumerate().skip(from) {
        match b {
            0x40..=0x7E => return i + 1,
            0x20..=0x3F => {}
            // Anything else aborts the sequence without consuming the byte.
            _ => return i,
        }
    }
    bytes.len()
}

fn string_end(bytes: &[u8], from: usize) -> usize {
    let mut i = from;
    while i < bytes.len() {
        match bytes[i] {
            0x07 => return i + 1,
            ESC if bytes.get(i + 1) == Some(&b'\\') => return i + 2,
            _ => i += 1,
        }
    }
    bytes.len()
}
