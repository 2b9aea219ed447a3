//! Prompt session lifecycle.
//!
//! ```text
//! Idle ──run──▶ Active ──submit──────────────▶ Resolved
//!                  └──interrupt / widget error / input closed──▶ Rejected
//! ```
//!
//! A session owns the terminal while it is Active: raw mode, a hidden cursor,
//! optional mouse tracking and the one input subscription. Every way out of
//! Active (including the run future being dropped) goes through a single
//! cleanup that restores all of it before the outcome is observable.

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::time::{sleep_until, Instant};
use tracing::{debug, warn};

use super::terminal::{StdTerminal, Terminal};
use super::widget::{Context, Widget, WidgetResult};
use crate::config::{Capabilities, SessionOptions};
use crate::error::{PromptError, Result};
use crate::input::{InputDecoder, InputEvent, InputSubscription};
use crate::renderer::{ansi, FrameRenderer, OutputBuffer};

// =============================================================================
// Lease
// =============================================================================

/// Set while some session in the process is Active.
static ACTIVE: AtomicBool = AtomicBool::new(false);

/// Proof that this session is the only Active one.
struct Lease;

impl Lease {
    fn acquire() -> Result<Self> {
        ACTIVE
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map(|_| Lease)
            .map_err(|_| PromptError::SessionBusy)
    }
}

impl Drop for Lease {
    fn drop(&mut self) {
        ACTIVE.store(false, Ordering::Release);
    }
}

/// Whether a session currently owns the terminal.
pub fn is_session_active() -> bool {
    ACTIVE.load(Ordering::Acquire)
}

// =============================================================================
// Session
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Active,
    Resolved,
    Rejected,
}

impl SessionState {
    /// Resolved or Rejected. Cleanup has run.
    pub fn is_settled(self) -> bool {
        matches!(self, Self::Resolved | Self::Rejected)
    }
}

/// One interactive prompt invocation.
pub struct Session<W: Widget> {
    widget: W,
    options: SessionOptions,
    renderer: FrameRenderer,
    state: SessionState,
}

impl<W: Widget> Session<W> {
    /// Set up a session. Touches neither the terminal nor the input stream.
    pub fn new(widget: W, options: SessionOptions) -> Self {
        let renderer = FrameRenderer::with_ellipsis(options.ellipsis.clone());
        Self {
            widget,
            options,
            renderer,
            state: SessionState::Idle,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn widget(&self) -> &W {
        &self.widget
    }

    pub fn into_widget(self) -> W {
        self.widget
    }

    /// Run on the process terminal until the widget submits.
    pub async fn run(mut self) -> Result<W::Output> {
        let mut terminal = StdTerminal::new();
        self.run_on(&mut terminal).await
    }

    /// Run on `terminal` until the widget submits.
    ///
    /// Fails with [`PromptError::AlreadyStarted`] unless the session is Idle,
    /// and with [`PromptError::SessionBusy`] while another session is Active
    /// (the session then stays Idle).
    pub async fn run_on<T: Terminal + ?Sized>(&mut self, terminal: &mut T) -> Result<W::Output> {
        if self.state != SessionState::Idle {
            return Err(PromptError::AlreadyStarted);
        }
        let _lease = Lease::acquire()?;

        let capabilities = self.options.capabilities.unwrap_or_else(Capabilities::detect);
        self.state = SessionState::Active;
        debug!(?capabilities, "session active");

        let mut run = Run {
            session: self,
            terminal,
            capabilities,
            teardown: Teardown::default(),
        };
        let outcome = run.drive().await;
        run.settle(outcome.is_ok());

        if let Err(err) = &outcome {
            debug!(error = %err, "session rejected");
        } else {
            debug!("session resolved");
        }
        outcome
    }
}

// =============================================================================
// Active run
// =============================================================================

/// Terminal changes made on entry that cleanup must undo.
#[derive(Debug, Default)]
struct Teardown {
    raw: bool,
    cursor_hidden: bool,
    mouse: bool,
    cleaned: bool,
}

/// A session while Active. Dropping it settles the session as Rejected.
struct Run<'a, W: Widget, T: Terminal + ?Sized> {
    session: &'a mut Session<W>,
    terminal: &'a mut T,
    capabilities: Capabilities,
    teardown: Teardown,
}

impl<W: Widget, T: Terminal + ?Sized> Run<'_, W, T> {
    async fn drive(&mut self) -> Result<W::Output> {
        self.terminal.enable_raw_mode()?;
        self.teardown.raw = true;

        // Dropped on every return from here, which detaches it from the hub
        // before cleanup runs.
        let mut input = self.terminal.subscribe()?;

        let mut setup = OutputBuffer::new();
        if self.capabilities.interactive {
            ansi::cursor_hide(&mut setup)?;
            self.teardown.cursor_hidden = true;
        }
        if self.capabilities.mouse && self.session.widget.wants_mouse() {
            ansi::enable_mouse(&mut setup)?;
            self.teardown.mouse = true;
        }
        setup.flush_to(self.terminal.writer())?;

        let mut decoder = InputDecoder::new(self.session.options.decoder);
        let mut submitted = None;
        self.dispatch(&mut submitted, |widget, cx| widget.render(cx, true))?;

        loop {
            if let Some(value) = submitted.take() {
                return Ok(value);
            }

            let received = next_chunk(&mut input, decoder.deadline()).await;
            let now = Instant::now().into_std();
            let events = match received {
                Wake::Bytes(bytes) => decoder.feed(&bytes, now),
                Wake::Deadline => decoder.expire(now),
                Wake::Closed => {
                    let pending = decoder.flush();
                    self.dispatch_events(pending, &mut submitted)?;
                    return submitted.take().ok_or(PromptError::InputClosed);
                }
            };
            self.dispatch_events(events, &mut submitted)?;
        }
    }

    fn dispatch_events(
        &mut self,
        events: Vec<InputEvent>,
        submitted: &mut Option<W::Output>,
    ) -> Result<()> {
        for event in events {
            if submitted.is_some() {
                break;
            }
            match event {
                InputEvent::Key(key) if key.is_interrupt() => {
                    debug!("interrupt received");
                    return Err(PromptError::Cancelled);
                }
                InputEvent::Key(key) => {
                    self.dispatch(submitted, |widget, cx| widget.handle_input(&key, cx))?;
                }
                InputEvent::Mouse(mouse) => {
                    self.dispatch(submitted, |widget, cx| widget.handle_mouse(&mouse, cx))?;
                }
                InputEvent::Scroll(scroll) => {
                    self.dispatch(submitted, |widget, cx| widget.handle_scroll(&scroll, cx))?;
                }
            }
        }
        Ok(())
    }

    fn dispatch<F>(&mut self, submitted: &mut Option<W::Output>, f: F) -> Result<()>
    where
        F: FnOnce(&mut W, &mut Context<'_, W::Output>) -> WidgetResult,
    {
        let columns = self.terminal.columns().unwrap_or(self.capabilities.columns);
        let session = &mut *self.session;
        let mut cx = Context::new(
            &mut session.renderer,
            self.terminal.writer(),
            usize::from(columns),
            submitted,
        );
        f(&mut session.widget, &mut cx).map_err(PromptError::Widget)
    }

    /// Run cleanup and move to the terminal state.
    fn settle(&mut self, resolved: bool) {
        self.cleanup();
        self.session.state = if resolved {
            SessionState::Resolved
        } else {
            SessionState::Rejected
        };
    }

    /// Restore the terminal and release the widget. Runs at most once.
    ///
    /// Failures are logged and do not change the session outcome.
    fn cleanup(&mut self) {
        if self.teardown.cleaned {
            return;
        }
        self.teardown.cleaned = true;

        if let Err(err) = self.restore_output() {
            warn!(error = %err, "failed to restore terminal output");
        }

        if self.teardown.raw {
            if let Err(err) = self.terminal.disable_raw_mode() {
                warn!(error = %err, "failed to leave raw mode");
            }
        }

        self.session.widget.cleanup();
        debug!("session cleaned up");
    }

    /// Step below the prompt block, then undo mouse tracking and cursor hiding.
    fn restore_output(&mut self) -> io::Result<()> {
        let writer = self.terminal.writer();
        self.session.renderer.finish(&mut *writer)?;

        let mut out = OutputBuffer::new();
        if self.teardown.mouse {
            ansi::disable_mouse(&mut out)?;
        }
        if self.teardown.cursor_hidden {
            ansi::cursor_show(&mut out)?;
        }
        out.flush_to(writer)?;
        Ok(())
    }
}

impl<W: Widget, T: Terminal + ?Sized> Drop for Run<'_, W, T> {
    fn drop(&mut self) {
        if !self.teardown.cleaned {
            self.settle(false);
            debug!("session dropped while active");
        }
    }
}

enum Wake {
    Bytes(Vec<u8>),
    Deadline,
    Closed,
}

/// Wait for input, or for the decoder deadline if one is pending.
async fn next_chunk(input: &mut InputSubscription, deadline: Option<std::time::Instant>) -> Wake {
    let received = match deadline {
        Some(deadline) => tokio::select! {
            biased;
            chunk = input.recv() => chunk,
            () = sleep_until(Instant::from_std(deadline)) => return Wake::Deadline,
        },
        None => input.recv().await,
    };
    match received {
        Some(bytes) => Wake::Bytes(bytes),
        None => Wake::Closed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn settled_states() {
        assert!(!SessionState::Idle.is_settled());
        assert!(!SessionState::Active.is_settled());
        assert!(SessionState::Resolved.is_settled());
        assert!(SessionState::Rejected.is_settled());
    }

    #[test]
    #[serial]
    fn lease_is_exclusive_until_dropped() {
        let lease = Lease::acquire().expect("first lease");
        assert!(is_session_active());
        assert!(matches!(Lease::acquire(), Err(PromptError::SessionBusy)));
        drop(lease);
        assert!(!is_session_active());
        assert!(Lease::acquire().is_ok());
    }
}
