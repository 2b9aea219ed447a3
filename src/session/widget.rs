//! The contract between a prompt session and the widget it drives.

use std::io::{self, Write};

use crate::error::WidgetError;
use crate::input::{KeyEvent, MouseEvent, ScrollEvent};
use crate::renderer::{FrameRenderer, RenderStats};

/// Outcome of a widget callback.
pub type WidgetResult = std::result::Result<(), WidgetError>;

/// A concrete prompt.
///
/// The session calls `render(cx, true)` once before any input, then one
/// handler per decoded event. Handlers mutate the widget's own state and
/// redraw through [`Context::render_frame`]; the prompt ends when a handler
/// calls [`Context::submit`]. Returning an error aborts the session with
/// [`PromptError::Widget`](crate::PromptError::Widget).
///
/// Ctrl+C never reaches a widget.
pub trait Widget {
    /// Value produced on submit.
    type Output;

    fn render(&mut self, cx: &mut Context<'_, Self::Output>, first: bool) -> WidgetResult;

    /// A key press. Use [`KeyEvent::char`] for the inserted text and
    /// [`KeyEvent::raw`] for the exact bytes.
    fn handle_input(&mut self, key: &KeyEvent, cx: &mut Context<'_, Self::Output>) -> WidgetResult;

    fn handle_mouse(&mut self, event: &MouseEvent, cx: &mut Context<'_, Self::Output>) -> WidgetResult {
        let _ = (event, cx);
        Ok(())
    }

    /// Wheel turn, delivered right after the matching `handle_mouse`.
    fn handle_scroll(&mut self, event: &ScrollEvent, cx: &mut Context<'_, Self::Output>) -> WidgetResult {
        let _ = (event, cx);
        Ok(())
    }

    /// Ask for mouse tracking while the session is active. Only honored when
    /// the terminal reports mouse support.
    fn wants_mouse(&self) -> bool {
        false
    }

    /// Release resources the widget holds beyond the terminal. Called exactly
    /// once when the session ends, whatever the outcome.
    fn cleanup(&mut self) {}
}

/// What a widget may do to its session from inside a callback.
pub struct Context<'a, T> {
    renderer: &'a mut FrameRenderer,
    out: &'a mut dyn Write,
    columns: usize,
    submitted: &'a mut Option<T>,
}

impl<'a, T> Context<'a, T> {
    pub(crate) fn new(
        renderer: &'a mut FrameRenderer,
        out: &'a mut dyn Write,
        columns: usize,
        submitted: &'a mut Option<T>,
    ) -> Self {
        Self {
            renderer,
            out,
            columns,
            submitted,
        }
    }

    /// Replace the prompt's on-screen block with `text`.
    ///
    /// Only lines that differ from the previous frame are written.
    pub fn render_frame(&mut self, text: &str) -> io::Result<RenderStats> {
        self.renderer.render(text, self.columns, &mut *self.out)
    }

    /// Resolve the session with `value`. Events after this one are ignored;
    /// a later call replaces the value.
    pub fn submit(&mut self, value: T) {
        *self.submitted = Some(value);
    }

    pub fn is_submitted(&self) -> bool {
        self.submitted.is_some()
    }

    /// Terminal width lines are clamped to.
    pub fn columns(&self) -> usize {
        self.columns
    }
}
