//! Terminal host for the chat session.
//!
//! * [`TerminalSurface`] — [`ChatSurface`](crate::session::ChatSurface)
//!   printing labelled turns, the waiting and recording indicators and
//!   alerts.
//! * [`TerminalSink`] — reveal sink typing a reply with ANSI styling.
//! * [`AnsiStyler`] — markup fragment → terminal text.

pub mod ansi;
pub mod terminal;

pub use ansi::{decode_text, AnsiStyler};
pub use terminal::{SharedWriter, TerminalSink, TerminalSurface};
