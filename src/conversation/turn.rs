//! A single conversation entry and its reveal lifecycle.

use crate::markup::Token;

// ---------------------------------------------------------------------------
// Speaker
// ---------------------------------------------------------------------------

/// Who authored a [`Turn`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Speaker {
    User,
    Assistant,
}

impl Speaker {
    /// Short label used by display surfaces and log lines.
    pub fn label(&self) -> &'static str {
        match self {
            Speaker::User => "user",
            Speaker::Assistant => "assistant",
        }
    }
}

// ---------------------------------------------------------------------------
// RevealState
// ---------------------------------------------------------------------------

/// Reveal progress of a turn.  Only ever moves forward:
/// `Pending → Revealing → Complete`.
///
/// The derived ordering follows that direction, so `a < b` means `b` is a
/// later state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RevealState {
    /// Created, content not yet on screen.
    Pending,
    /// Tokens are being appended to the display.
    Revealing,
    /// Everything that will be shown is shown.
    Complete,
}

// ---------------------------------------------------------------------------
// TurnHandle
// ---------------------------------------------------------------------------

/// Stable reference to a turn inside a [`MessageStore`](super::MessageStore).
///
/// Turns are never removed, so the position in the log is stable for the
/// lifetime of the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TurnHandle(pub(crate) usize);

impl TurnHandle {
    /// Zero-based position of the turn in the conversation.
    pub fn index(&self) -> usize {
        self.0
    }
}

// ---------------------------------------------------------------------------
// Turn
// ---------------------------------------------------------------------------

/// One message in the conversation.
#[derive(Debug, Clone, PartialEq)]
pub struct Turn {
    speaker: Speaker,
    raw_text: String,
    rendered_tokens: Option<Vec<Token>>,
    reveal_state: RevealState,
}

impl Turn {
    /// User turns are complete on creation; assistant turns start pending.
    pub(crate) fn new(speaker: Speaker, raw_text: String) -> Self {
        let reveal_state = match speaker {
            Speaker::User => RevealState::Complete,
            Speaker::Assistant => RevealState::Pending,
        };
        Self {
            speaker,
            raw_text,
            rendered_tokens: None,
            reveal_state,
        }
    }

    pub fn speaker(&self) -> Speaker {
        self.speaker
    }

    /// The original, unrendered text.
    pub fn raw_text(&self) -> &str {
        &self.raw_text
    }

    /// Token stream of an assistant turn, set once its reveal begins.
    pub fn rendered_tokens(&self) -> Option<&[Token]> {
        self.rendered_tokens.as_deref()
    }

    pub fn reveal_state(&self) -> RevealState {
        self.reveal_state
    }

    pub fn is_complete(&self) -> bool {
        self.reveal_state == RevealState::Complete
    }

    /// Store the token stream and enter `Revealing`.  Callers have already
    /// checked the transition is legal.
    pub(crate) fn start_reveal(&mut self, tokens: Vec<Token>) {
        self.rendered_tokens = Some(tokens);
        self.reveal_state = RevealState::Revealing;
    }

    /// Move to `Complete`.  Returns `false` when already complete.
    pub(crate) fn finish_reveal(&mut self) -> bool {
        if self.reveal_state == RevealState::Complete {
            return false;
        }
        self.reveal_state = RevealState::Complete;
        true
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
