//! Grapheme-safe splitting.
//!
//! Cursor movement and edits inside a prompt operate on user-perceived
//! characters. A flag, a ZWJ family or a skin-toned emoji is one unit and must
//! never be split between its codepoints.

use unicode_segmentation::{GraphemeIndices, UnicodeSegmentation};

use super::width::grapheme_width;

/// Lazy iterator over the grapheme clusters of a string.
///
/// Finite, and restartable: cloning yields an independent iterator from the
/// current position, and [`Graphemes::restart`] rewinds to the beginning.
#[derive(Clone)]
pub struct Graphemes<'a> {
    source: &'a str,
    inner: GraphemeIndices<'a>,
}

impl<'a> Graphemes<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            inner: source.grapheme_indices(true),
        }
    }

    /// A fresh iterator over the same text.
    pub fn restart(&self) -> Self {
        Self::new(self.source)
    }

    /// Pair each cluster with its display width.
    pub fn with_widths(self) -> impl Iterator<Item = (&'a str, usize)> {
        self.map(|g| (g, grapheme_width(g)))
    }
}

impl<'a> Iterator for Graphemes<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(_, g)| g)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl DoubleEndedIterator for Graphemes<'_> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back().map(|(_, g)| g)
    }
}

/// Iterate the grapheme clusters of `s`.
pub fn graphemes(s: &str) -> Graphemes<'_> {
    Graphemes::new(s)
}

/// Number of user-perceived characters in `s`.
pub fn grapheme_count(s: &str) -> usize {
    s.graphemes(true).count()
}

/// `offset` clamped to `s.len()` and moved back to a char boundary.
fn floor_char_boundary(s: &str, offset: usize) -> usize {
    let mut offset = offset.min(s.len());
    while !s.is_char_boundary(offset) {
        offset -= 1;
    }
    offset
}

/// Byte offset of the grapheme boundary after `offset`, or `s.len()`.
///
/// An offset past the end or inside a character is first moved back to the
/// nearest char boundary.
pub fn next_boundary(s: &str, offset: usize) -> usize {
    let offset = floor_char_boundary(s, offset);
    s[offset..]
        .graphemes(true)
        .next()
        .map_or(s.len(), |g| offset + g.len())
}

/// Byte offset of the grapheme boundary before `offset`, or 0.
///
/// Out-of-range offsets are clamped as in [`next_boundary`].
pub fn prev_boundary(s: &str, offset: usize) -> usize {
    let offset = floor_char_boundary(s, offset);
    s[..offset]
        .graphemes(true)
        .next_back()
        .map_or(0, |g| offset - g.len())
}
