//! One rendered generation of a prompt.

use crate::text::truncate_line;

/// A text block split into lines and clamped to a terminal width.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    lines: Vec<String>,
    width: usize,
}

impl Frame {
    /// Split `text` on line feeds (a trailing CR per line is dropped) and clamp
    /// each line to `width` cells. A width of 0 means unbounded.
    ///
    /// Never empty: an empty block is one empty line.
    pub fn build(text: &str, width: usize, ellipsis: &str) -> Self {
        let limit = if width == 0 { usize::MAX } else { width };
        let lines = text
            .split('\n')
            .map(|line| {
                let line = line.strip_suffix('\r').unwrap_or(line);
                truncate_line(line, limit, ellipsis).into_owned()
            })
            .collect();
        Self { lines, width }
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Number of terminal rows the frame occupies.
    pub fn height(&self) -> usize {
        self.lines.len()
    }

    /// Width the lines were clamped to.
    pub fn width(&self) -> usize {
        self.width
    }
}
