//! Per-invocation prompt lifecycle.
//!
//! A [`Session`] wires the input decoder to a [`Widget`] and the widget's
//! frames to the renderer, owning the terminal from `run` until the prompt
//! settles.

mod controller;
mod terminal;
mod widget;

pub use controller::{is_session_active, Session, SessionState};
pub use terminal::{StdTerminal, Terminal};
pub use widget::{Context, Widget, WidgetResult};
