//! Input side of a prompt session.
//!
//! ```text
//! stdin bytes → InputHub → InputSubscription → InputDecoder → InputEvent
//!                (one subscriber at a time)    (state persists across chunks)
//! ```

pub mod decoder;
pub mod events;
pub mod reader;

pub use decoder::{DecoderState, InputDecoder};
pub use events::{
    InputEvent, KeyCode, KeyEvent, Modifier, MouseAction, MouseButton, MouseEvent,
    ScrollDirection, ScrollEvent, INTERRUPT_BYTE,
};
pub use reader::{stdin_hub, InputHub, InputSubscription};
