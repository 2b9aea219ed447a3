//! Text measurement for terminal output.
//!
//! Pure functions over `&str`:
//!
//! - **Escape stripping**: CSI, OSC, DCS/PM/APC and two-byte escapes removed
//! - **Visible width**: per-codepoint widths folded per grapheme cluster
//! - **Grapheme splitting**: lazy, restartable cluster iteration for edits
//! - **Truncation**: escape-aware width clamp with ellipsis and style reset
//!
//! Built on `unicode-width` (East Asian Width) and `unicode-segmentation`
//! (UAX #29 cluster boundaries), with a fixed emoji range table on top.

mod ansi;
mod graphemes;
mod truncate;
mod width;

pub use ansi::strip_ansi;
pub use graphemes::{grapheme_count, graphemes, next_boundary, prev_boundary, Graphemes};
pub use truncate::{truncate_line, ELLIPSIS, STYLE_RESET};
pub use width::{char_width, grapheme_width, string_width, utf16_width};
