//! Visible width of terminal text.
//!
//! Width is always computed per Unicode scalar value and then folded per
//! grapheme cluster, so a string's width never depends on how it was encoded.

use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthChar;

use super::ansi::strip_ansi;

/// Codepoint ranges that terminals draw two cells wide even where the East
/// Asian Width tables say "ambiguous" or "neutral".
///
/// In the symbol and dingbat blocks only Emoji_Presentation codepoints are
/// listed; text-style symbols such as ✔ and ❯ stay one cell.
const WIDE_EMOJI: &[(u32, u32)] = &[
    (0x2614, 0x2615),
    (0x2648, 0x2653),
    (0x267F, 0x267F),
    (0x2693, 0x2693),
    (0x26A1, 0x26A1),
    (0x26AA, 0x26AB),
    (0x26BD, 0x26BE),
    (0x26C4, 0x26C5),
    (0x26CE, 0x26CE),
    (0x26D4, 0x26D4),
    (0x26EA, 0x26EA),
    (0x26F2, 0x26F3),
    (0x26F5, 0x26F5),
    (0x26FA, 0x26FA),
    (0x26FD, 0x26FD),
    (0x2705, 0x2705),
    (0x270A, 0x270B),
    (0x2728, 0x2728),
    (0x274C, 0x274C),
    (0x274E, 0x274E),
    (0x2753, 0x2755),
    (0x2757, 0x2757),
    (0x2795, 0x2797),
    (0x27B0, 0x27B0),
    (0x27BF, 0x27BF),
    (0x1F300, 0x1F5FF), // pictographs
    (0x1F600, 0x1F64F), // emoticons
    (0x1F680, 0x1F6FF), // transport
    (0x1F900, 0x1F9FF), // supplemental pictographs
    (0x1FA70, 0x1FAFF), // pictographs extended-A
];

/// Width of one codepoint: 0, 1 or 2 cells.
///
/// Controls, combining marks and joiners are 0; CJK ideographs, fullwidth
/// forms and emoji are 2; everything else is 1.
#[inline]
pub fn char_width(c: char) -> usize {
    let cp = c as u32;
    if WIDE_EMOJI.iter().any(|&(lo, hi)| (lo..=hi).contains(&cp)) {
        return 2;
    }
    c.width().unwrap_or(0)
}

/// Width of one grapheme cluster.
///
/// Multi-codepoint emoji (flags, ZWJ families, skin tones, keycaps, VS16
/// presentation) collapse to 2 cells; a base plus combining marks keeps the
/// base width.
pub fn grapheme_width(grapheme: &str) -> usize {
    let mut chars = grapheme.chars();
    let Some(first) = chars.next() else {
        return 0;
    };
    if chars.as_str().is_empty() {
        return char_width(first);
    }

    // Regional indicator pair.
    if (0x1F1E6..=0x1F1FF).contains(&(first as u32)) {
        return 2;
    }

    let emoji_sequence = chars.any(|c| {
        matches!(c as u32, 0x200D | 0xFE0F | 0x20E3 | 0x1F3FB..=0x1F3FF)
    });
    if emoji_sequence {
        return 2;
    }

    char_width(first)
}

/// Visible width of `s` in terminal cells. Escape sequences count as zero.
pub fn string_width(s: &str) -> usize {
    if s.is_empty() {
        return 0;
    }
    if s.is_ascii() && !s.as_bytes().contains(&0x1B) {
        return s.bytes().filter(|b| (0x20..0x7F).contains(b)).count();
    }
    strip_ansi(s).graphemes(true).map(grapheme_width).sum()
}

/// Visible width of UTF-16 text.
///
/// Surrogate pairs are combined into codepoints before measuring; a lone
/// surrogate counts as one replacement character.
pub fn utf16_width(units: &[u16]) -> usize {
    let s: String = char::decode_utf16(units.iter().copied())
        .map(|r| r.unwrap_or(char::REPLACEMENT_CHARACTER))
        .collect();
    string_width(&s)
}
