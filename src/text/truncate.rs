//! Escape-aware truncation of one display line.
//!
//! Style codes never count toward width and are copied whole, so a cut can
//! only land between visible grapheme clusters. When content is dropped the
//! ellipsis is appended followed by an SGR reset, so a cut inside a styled
//! span cannot bleed into the next line.

use std::borrow::Cow;

use unicode_segmentation::UnicodeSegmentation;

use super::ansi::escape_len;
use super::width::{grapheme_width, string_width};

/// Reset appended after a truncation ellipsis.
pub const STYLE_RESET: &str = "\x1b[0m";

/// Default truncation marker.
pub const ELLIPSIS: &str = "…";

/// Clamp `line` to `max_width` visible cells.
///
/// Returns the line unchanged (borrowed) when it already fits.
pub fn truncate_line<'a>(line: &'a str, max_width: usize, ellipsis: &str) -> Cow<'a, str> {
    if string_width(line) <= max_width {
        return Cow::Borrowed(line);
    }
    if max_width == 0 {
        return Cow::Owned(String::new());
    }

    let ellipsis_width = string_width(ellipsis);
    let mut out = String::with_capacity(line.len().min(max_width * 4) + 8);

    if ellipsis_width >= max_width {
        // Not even the marker fits: show as much of it as possible.
        take_visible(ellipsis, max_width, &mut out);
    } else {
        take_visible(line, max_width - ellipsis_width, &mut out);
        out.push_str(ellipsis);
    }
    out.push_str(STYLE_RESET);
    Cow::Owned(out)
}

/// Copy escape codes and whole graphemes from `src` into `out` until the next
/// grapheme would exceed `budget` cells.
fn take_visible(src: &str, budget: usize, out: &mut String) {
    let bytes = src.as_bytes();
    let mut used = 0;
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] == 0x1B {
            let len = escape_len(bytes, i);
            out.push_str(&src[i..i + len]);
            i += len;
            continue;
        }

        let end = bytes[i..]
            .iter()
            .position(|&b| b == 0x1B)
            .map_or(bytes.len(), |p| i + p);
        for g in src[i..end].graphemes(true) {
            let w = grapheme_width(g);
            if used + w > budget {
                return;
            }
            out.push_str(g);
            used += w;
        }
        i = end;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fitting_line_is_borrowed() {
        assert!(matches!(truncate_line("short", 10, ELLIPSIS), Cow::Borrowed("short")));
        assert!(matches!(truncate_line("exact", 5, ELLIPSIS), Cow::Borrowed(_)));
    }

    #[test]
    fn cut_appends_ellipsis_and_reset() {
        assert_eq!(truncate_line("hello world", 6, ELLIPSIS), "hello…\x1b[0m");
    }

    #[test]
    fn style_codes_do_not_count_and_are_not_split() {
        let line = "\x1b[31mred text\x1b[0m";
        let cut = truncate_line(line, 4, ELLIPSIS);
        assert_eq!(cut, "\x1b[31mred…\x1b[0m");
        assert_eq!(string_width(&cut), 4);
    }

    #[test]
    fn wide_char_never_straddles_the_limit() {
        // 你(2) 好(2) fits 4 of a 5-cell budget minus the ellipsis.
        assert_eq!(truncate_line("你好世界", 5, ELLIPSIS), "你好…\x1b[0m");
        assert_eq!(truncate_line("你好世界", 4, ELLIPSIS), "你…\x1b[0m");
    }

    #[test]
    fn emoji_cluster_kept_whole() {
        let family = "👨\u{200D}👩\u{200D}👧";
        let line = format!("{family}{family}{family}");
        let cut = truncate_line(&line, 3, ELLIPSIS);
        assert_eq!(cut, format!("{family}…\x1b[0m"));
    }

    #[test]
    fn zero_width_budget() {
        assert_eq!(truncate_line("abc", 0, ELLIPSIS), "");
    }

    #[test]
    fn marker_wider_than_budget() {
        assert_eq!(truncate_line("abcdef", 2, "..."), "..\x1b[0m");
    }

    #[test]
    fn escapes_after_cut_are_dropped() {
        let cut = truncate_line("abcdef\x1b[1mXYZ", 3, ELLIPSIS);
        assert_eq!(cut, "ab…\x1b[0m");
    }
}
