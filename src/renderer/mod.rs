//! Inline frame renderer.
//!
//! Prompts draw below the shell's current output instead of taking over the
//! screen. Each frame is a block of lines; [`FrameRenderer`] keeps the last
//! one and rewrites only what changed.

pub mod ansi;
mod diff;
mod frame;
mod output;

pub use diff::{FrameRenderer, RenderStats};
pub use frame::Frame;
pub use output::OutputBuffer;
