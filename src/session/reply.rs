//! Turning a `/chat` outcome into the assistant bubble the user sees.

use crate::backend::{BackendError, ChatReply};
use crate::config::MessagesConfig;

/// Text of one assistant bubble.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssistantMessage {
    pub text: String,
    /// Only genuine replies are read aloud; error and fallback bubbles are
    /// not.
    pub speak: bool,
}

impl AssistantMessage {
    /// Map a chat outcome onto a bubble using the configured wording.
    ///
    /// | Outcome | Bubble | Spoken |
    /// |---|---|---|
    /// | `Response(text)` | `text` | yes |
    /// | `Error(msg)` | `error_prefix` + `msg` | no |
    /// | `Empty` | `empty_reply` | no |
    /// | any `BackendError` | `unreachable` | no |
    pub fn from_chat(
        outcome: Result<ChatReply, BackendError>,
        messages: &MessagesConfig,
    ) -> Self {
        match outcome {
            Ok(ChatReply::Response(text)) => Self { text, speak: true },
            Ok(ChatReply::Error(msg)) => Self::silent(format!("{}{msg}", messages.error_prefix)),
            Ok(ChatReply::Empty) => Self::silent(messages.empty_reply.clone()),
            Err(e) => {
                if e.is_connectivity() {
                    log::warn!("chat: backend unreachable: {e}");
                } else {
                    log::warn!("chat: unusable reply: {e}");
                }
                Self::silent(messages.unreachable.clone())
            }
        }
    }

    fn silent(text: String) -> Self {
        Self { text, speak: false }
    }
}
