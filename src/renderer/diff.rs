//! Line-differential renderer for inline prompts.
//!
//! The prompt occupies a block of rows starting wherever the cursor was when
//! the first frame was drawn. Each render compares the new frame to the
//! previous one line by line and rewrites only the lines that changed.
//!
//! # Algorithm
//!
//! 1. Wrap output in a synchronized block (begin_sync/end_sync)
//! 2. Move from the last row of the previous frame to its first row
//! 3. For each new line: if unchanged, step over it; otherwise erase the row
//!    and write the line
//! 4. If the frame shrank, step past the last new line, erase everything
//!    below, and step back up
//! 5. Flush the output buffer (single write)
//! 6. Store the frame for the next comparison
//!
//! After every render the cursor rests on the frame's last row. A change of
//! terminal width invalidates the diff and redraws the whole block.

use std::io::{self, Write};

use tracing::{debug, trace};

use super::ansi;
use super::frame::Frame;
use super::output::OutputBuffer;
use crate::text::ELLIPSIS;

/// What a single render call did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderStats {
    /// Lines erased and rewritten.
    pub lines_written: usize,
    /// Bytes handed to the sink.
    pub bytes: usize,
    /// The whole block was redrawn.
    pub full_redraw: bool,
}

/// Differential renderer for an inline block of text.
#[derive(Debug)]
pub struct FrameRenderer {
    output: OutputBuffer,
    previous: Option<Frame>,
    ellipsis: String,
    synchronized: bool,
    force_full: bool,
}

impl FrameRenderer {
    pub fn new() -> Self {
        Self::with_ellipsis(ELLIPSIS)
    }

    /// Renderer that marks truncated lines with `ellipsis`.
    pub fn with_ellipsis(ellipsis: impl Into<String>) -> Self {
        Self {
            output: OutputBuffer::new(),
            previous: None,
            ellipsis: ellipsis.into(),
            synchronized: true,
            force_full: false,
        }
    }

    /// Toggle synchronized-output brackets around each render.
    pub fn synchronized(mut self, enabled: bool) -> Self {
        self.synchronized = enabled;
        self
    }

    /// Rows occupied by the last rendered frame, 0 if nothing is on screen.
    pub fn height(&self) -> usize {
        self.previous.as_ref().map_or(0, Frame::height)
    }

    pub fn previous(&self) -> Option<&Frame> {
        self.previous.as_ref()
    }

    /// Redraw every line on the next render.
    pub fn invalidate(&mut self) {
        self.force_full = true;
    }

    /// Draw `text` in place of the previous frame.
    ///
    /// `columns` is the terminal width; lines wider than it are truncated.
    pub fn render<W: Write + ?Sized>(
        &mut self,
        text: &str,
        columns: usize,
        sink: &mut W,
    ) -> io::Result<RenderStats> {
        let frame = Frame::build(text, columns, &self.ellipsis);

        if !self.force_full && self.previous.as_ref() == Some(&frame) {
            return Ok(RenderStats::default());
        }

        let full = self
            .previous
            .as_ref()
            .is_some_and(|prev| self.force_full || prev.width() != frame.width());

        let sent = self
            .encode(&frame, full)
            .and_then(|lines_written| Ok((lines_written, self.output.flush_to(sink)?)));
        let (lines_written, bytes) = match sent {
            Ok(sent) => sent,
            Err(err) => {
                self.abandon(&err);
                return Err(err);
            }
        };
        trace!(
            height = frame.height(),
            lines_written,
            bytes,
            full_redraw = full,
            "frame rendered"
        );

        self.previous = Some(frame);
        self.force_full = false;

        Ok(RenderStats {
            lines_written,
            bytes,
            full_redraw: full,
        })
    }

    /// Buffer the update from the previous frame to `frame`. Returns the
    /// number of lines rewritten.
    fn encode(&mut self, frame: &Frame, full: bool) -> io::Result<usize> {
        let previous = self.previous.as_ref();
        let out = &mut self.output;

        if self.synchronized {
            ansi::begin_sync(out)?;
        }

        if let Some(prev) = previous {
            ansi::cursor_up(out, prev.height() - 1)?;
            ansi::cursor_column_zero(out)?;
            if full {
                ansi::erase_down(out)?;
            }
        }

        let old: &[String] = match previous {
            Some(prev) if !full => prev.lines(),
            _ => &[],
        };

        let mut lines_written = 0;
        for (i, line) in frame.lines().iter().enumerate() {
            if i > 0 {
                out.write_str(ansi::LINE_BREAK);
            }
            if old.get(i) != Some(line) {
                ansi::erase_line(out)?;
                out.write_str(line);
                lines_written += 1;
            }
        }

        // Rows below the new frame still hold old lines. Step past the last
        // new line before erasing so it survives even if it was not rewritten.
        if old.len() > frame.height() {
            out.write_str(ansi::LINE_BREAK);
            ansi::erase_down(out)?;
            ansi::cursor_up(out, 1)?;
        }

        if self.synchronized {
            ansi::end_sync(out)?;
        }
        Ok(lines_written)
    }

    /// A write failed part way: the screen no longer matches the baseline.
    /// Keep the last good anchor and redraw the whole block next time.
    fn abandon(&mut self, err: &io::Error) {
        self.output.clear();
        self.force_full = true;
        debug!(error = %err, "frame write failed; next render redraws");
    }

    /// Erase the block and leave the cursor where its first row was.
    pub fn clear<W: Write + ?Sized>(&mut self, sink: &mut W) -> io::Result<()> {
        if let Some(prev) = &self.previous {
            ansi::cursor_up(&mut self.output, prev.height() - 1)?;
            ansi::cursor_column_zero(&mut self.output)?;
            ansi::erase_down(&mut self.output)?;
            if let Err(err) = self.output.flush_to(sink) {
                self.abandon(&err);
                return Err(err);
            }
        }
        self.previous = None;
        self.force_full = false;
        Ok(())
    }

    /// Move the cursor below the block and forget it. The block stays on
    /// screen and later output starts on a fresh row.
    pub fn finish<W: Write + ?Sized>(&mut self, sink: &mut W) -> io::Result<()> {
        if self.previous.is_some() {
            ansi::reset(&mut self.output)?;
            self.output.write_str(ansi::LINE_BREAK);
            if let Err(err) = self.output.flush_to(sink) {
                self.abandon(&err);
                return Err(err);
            }
        }
        self.previous = None;
        self.force_full = false;
        Ok(())
    }
}

impl Default for FrameRenderer {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Tests
// =============================================================================
