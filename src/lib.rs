//! # spark-prompt
//!
//! Core of an inline interactive terminal prompt toolkit.
//!
//! ## Architecture
//!
//! ```text
//! stdin ─▶ InputHub ─▶ InputDecoder ─▶ Session ─▶ Widget
//!                                         │          │ render_frame(text)
//!                                         ▼          ▼
//!                                   FrameRenderer ─▶ stdout (line diff)
//! ```
//!
//! Widgets are plain types implementing [`Widget`]. A [`Session`] owns the
//! terminal for one invocation: raw mode, cursor, mouse tracking and the
//! single input subscription, all restored exactly once however the prompt
//! ends.
//!
//! ## Modules
//!
//! - [`text`] - Visible width, escape stripping, graphemes, truncation
//! - [`input`] - Byte-stream decoder and the exclusive input hub
//! - [`renderer`] - Line-diff inline renderer
//! - [`session`] - Session lifecycle, widget contract, terminal seam
//! - [`config`] - Decoder tuning, capabilities, session options
//! - [`logging`] - `tracing` subscriber setup

pub mod config;
pub mod error;
pub mod input;
pub mod logging;
pub mod renderer;
pub mod session;
pub mod text;

pub use config::{Capabilities, DecoderConfig, SessionOptions};
pub use error::{PromptError, Result, WidgetError};
pub use input::{
    InputDecoder, InputEvent, KeyCode, KeyEvent, Modifier, MouseAction, MouseButton,
    MouseEvent, ScrollDirection, ScrollEvent,
};
pub use renderer::{Frame, FrameRenderer};
pub use session::{Context, Session, SessionState, StdTerminal, Terminal, Widget, WidgetResult};
pub use text::{string_width, strip_ansi, truncate_line};
