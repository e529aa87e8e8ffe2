//! The display the session drives.

use crate::conversation::TurnHandle;
use crate::reveal::SharedSink;

/// Everything the chat session shows to the user.
///
/// Implementations own the actual widgets (terminal lines, chat
/// windows); the session only tells them what happened.
pub trait ChatSurface: Send {
    /// A user bubble with `text`, shown whole.
    fn show_user_turn(&mut self, handle: TurnHandle, text: &str);

    /// Open an empty assistant bubble (with a typing cursor) and return the
    /// sink its reveal streams into.
    fn open_assistant_turn(&mut self, handle: TurnHandle) -> SharedSink;

    /// A chat request is in flight (`true`) or has been answered (`false`).
    fn set_waiting(&mut self, waiting: bool);

    /// The microphone started (`true`) or stopped (`false`) recording.
    fn set_recording(&mut self, recording: bool);

    /// A blocking notice the user must acknowledge.
    fn alert(&mut self, message: &str);
}
