//! Append-only conversation log with reveal bookkeeping.

use thiserror::Error;
use tokio::sync::mpsc;

use crate::markup::Token;

use super::turn::{RevealState, Speaker, Turn, TurnHandle};

// ---------------------------------------------------------------------------
// StoreError
// ---------------------------------------------------------------------------

/// Rejected reveal transitions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The handle does not belong to this store.
    #[error("no turn at position {0}")]
    UnknownTurn(usize),

    /// Reveals may only start on the most recent assistant turn.
    #[error("turn {0} is not the most recent assistant turn")]
    NotLatestAssistant(usize),

    /// The turn already finished revealing.
    #[error("turn {0} is already complete")]
    AlreadyComplete(usize),

    /// The turn already has its token stream.
    #[error("turn {0} is already revealing")]
    AlreadyRevealing(usize),
}

// ---------------------------------------------------------------------------
// StoreEvent
// ---------------------------------------------------------------------------

/// Notification sent to display surfaces after each store mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreEvent {
    /// A new turn was added at the end of the log.
    Appended { handle: TurnHandle, speaker: Speaker },
    /// An assistant turn entered `Revealing`.
    RevealStarted { handle: TurnHandle },
    /// An assistant turn reached `Complete`.
    RevealCompleted { handle: TurnHandle },
}

// ---------------------------------------------------------------------------
// MessageStore
// ---------------------------------------------------------------------------

/// Ordered, append-only log of [`Turn`]s.
///
/// Single writer: the owning session mutates it from one task.  Listeners
/// receive [`StoreEvent`]s over unbounded channels so a slow display never
/// blocks the writer.
#[derive(Debug, Default)]
pub struct MessageStore {
    turns: Vec<Turn>,
    listeners: Vec<mpsc::UnboundedSender<StoreEvent>>,
}

impl MessageStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener for every subsequent [`StoreEvent`].
    pub fn subscribe(&mut self) -> mpsc::UnboundedReceiver<StoreEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.listeners.push(tx);
        rx
    }

    // -----------------------------------------------------------------------
    // Mutation
    // -----------------------------------------------------------------------

    /// Add a turn at the end of the log and return its handle.
    ///
    /// User turns are created `Complete`, assistant turns `Pending`.
    pub fn append(&mut self, speaker: Speaker, raw_text: impl Into<String>) -> TurnHandle {
        let handle = TurnHandle(self.turns.len());
        self.turns.push(Turn::new(speaker, raw_text.into()));
        log::debug!("store: appended {} turn #{}", speaker.label(), handle.0);
        self.emit(StoreEvent::Appended { handle, speaker });
        handle
    }

    /// Attach `tokens` to the turn and move it to `Revealing`.
    ///
    /// Any other assistant turn still revealing is forced to `Complete`
    /// first, so at most one turn is ever revealing.
    ///
    /// # Errors
    ///
    /// * [`StoreError::UnknownTurn`] — handle out of range.
    /// * [`StoreError::NotLatestAssistant`] — a newer assistant turn exists
    ///   or the turn is a user turn.
    /// * [`StoreError::AlreadyComplete`] / [`StoreError::AlreadyRevealing`] —
    ///   the turn is past `Pending`.
    pub fn begin_reveal(&mut self, handle: TurnHandle, tokens: Vec<Token>) -> Result<(), StoreError> {
        let turn = self
            .turns
            .get(handle.0)
            .ok_or(StoreError::UnknownTurn(handle.0))?;

        if self.latest_assistant() != Some(handle) {
            return Err(StoreError::NotLatestAssistant(handle.0));
        }
        match turn.reveal_state() {
            RevealState::Pending => {}
            RevealState::Revealing => return Err(StoreError::AlreadyRevealing(handle.0)),
            RevealState::Complete => return Err(StoreError::AlreadyComplete(handle.0)),
        }

        let stale: Vec<TurnHandle> = self
            .turns
            .iter()
            .enumerate()
            .filter(|(_, t)| t.reveal_state() == RevealState::Revealing)
            .map(|(i, _)| TurnHandle(i))
            .collect();
        for other in stale {
            log::debug!("store: forcing turn #{} complete", other.0);
            self.complete_reveal(other)?;
        }

        self.turns[handle.0].start_reveal(tokens);
        self.emit(StoreEvent::RevealStarted { handle });
        Ok(())
    }

    /// Move the turn to `Complete`.  Idempotent.
    pub fn complete_reveal(&mut self, handle: TurnHandle) -> Result<(), StoreError> {
        let turn = self
            .turns
            .get_mut(handle.0)
            .ok_or(StoreError::UnknownTurn(handle.0))?;

        if turn.finish_reveal() {
            self.emit(StoreEvent::RevealCompleted { handle });
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    pub fn get(&self, handle: TurnHandle) -> Option<&Turn> {
        self.turns.get(handle.0)
    }

    /// All turns in insertion order.
    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    /// Handle of the most recent assistant turn, if any.
    pub fn latest_assistant(&self) -> Option<TurnHandle> {
        self.turns
            .iter()
            .rposition(|t| t.speaker() == Speaker::Assistant)
            .map(TurnHandle)
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    fn emit(&mut self, event: StoreEvent) {
        self.listeners.retain(|tx| tx.send(event.clone()).is_ok());
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markup::tokenize;

    #[test]
    fn append_preserves_insertion_order() {
        let mut store = MessageStore::new();
        let texts = ["one", "two", "three", "four", "five"];
        let handles: Vec<TurnHandle> = texts
            .iter()
            .enumerate()
            .map(|(i, t)| {
                let speaker = if i % 2 == 0 { Speaker::User } else { Speaker::Assistant };
                store.append(speaker, *t)
            })
            .collect();

        assert_eq!(store.len(), texts.len());
        for (i, (handle, text)) in handles.iter().zip(texts.iter()).enumerate() {
            assert_eq!(handle.index(), i);
            assert_eq!(store.get(*handle).unwrap().raw_text(), *text);
        }
        let all: Vec<&str> = store.turns().iter().map(|t| t.raw_text()).collect();
        assert_eq!(all, texts);
    }

    #[test]
    fn begin_reveal_stores_tokens() {
        let mut store = MessageStore::new();
        let h = store.append(Speaker::Assistant, "<em>hi</em>");
        store.begin_reveal(h, tokenize("<em>hi</em>")).unwrap();

        let turn = store.get(h).unwrap();
        assert_eq!(turn.reveal_state(), RevealState::Revealing);
        assert_eq!(turn.rendered_tokens().unwrap().len(), 3);
    }

    #[test]
    fn begin_reveal_rejects_older_assistant_turn() {
        let mut store = MessageStore::new();
        let old = store.append(Speaker::Assistant, "first");
        store.append(Speaker::Assistant, "second");

        assert_eq!(
            store.begin_reveal(old, tokenize("first")),
            Err(StoreError::NotLatestAssistant(0))
        );
    }

    #[test]
    fn begin_reveal_rejects_user_turn() {
        let mut store = MessageStore::new();
        let user = store.append(Speaker::User, "hello");
        assert_eq!(
            store.begin_reveal(user, tokenize("hello")),
            Err(StoreError::NotLatestAssistant(0))
        );
    }

    #[test]
    fn begin_reveal_rejects_completed_turn() {
        let mut store = MessageStore::new();
        let h = store.append(Speaker::Assistant, "done");
        store.complete_reveal(h).unwrap();
        assert_eq!(
            store.begin_reveal(h, tokenize("done")),
            Err(StoreError::AlreadyComplete(0))
        );
    }

    #[test]
    fn begin_reveal_twice_keeps_first_tokens() {
        let mut store = MessageStore::new();
        let h = store.append(Speaker::Assistant, "a");
        store.begin_reveal(h, tokenize("a")).unwrap();
        assert_eq!(
            store.begin_reveal(h, tokenize("<b>b</b>")),
            Err(StoreError::AlreadyRevealing(0))
        );
        assert_eq!(store.get(h).unwrap().rendered_tokens().unwrap().len(), 1);
    }

    #[test]
    fn unknown_handle_is_rejected() {
        let mut store = MessageStore::new();
        assert_eq!(
            store.complete_reveal(TurnHandle(7)),
            Err(StoreError::UnknownTurn(7))
        );
    }

    #[test]
    fn new_reveal_forces_previous_complete() {
        let mut store = MessageStore::new();
        let first = store.append(Speaker::Assistant, "first");
        store.begin_reveal(first, tokenize("first")).unwrap();

        store.append(Speaker::User, "next question");
        let second = store.append(Speaker::Assistant, "second");
        store.begin_reveal(second, tokenize("second")).unwrap();

        assert_eq!(store.get(first).unwrap().reveal_state(), RevealState::Complete);
        assert_eq!(store.get(second).unwrap().reveal_state(), RevealState::Revealing);
    }

    #[test]
    fn complete_reveal_is_idempotent() {
        let mut store = MessageStore::new();
        let mut events = store.subscribe();
        let h = store.append(Speaker::Assistant, "x");
        store.begin_reveal(h, tokenize("x")).unwrap();
        store.complete_reveal(h).unwrap();
        store.complete_reveal(h).unwrap();

        let mut received = Vec::new();
        while let Ok(ev) = events.try_recv() {
            received.push(ev);
        }
        assert_eq!(
            received,
            vec![
                StoreEvent::Appended { handle: h, speaker: Speaker::Assistant },
                StoreEvent::RevealStarted { handle: h },
                StoreEvent::RevealCompleted { handle: h },
            ]
        );
    }

    #[test]
    fn dropped_listener_is_pruned() {
        let mut store = MessageStore::new();
        let rx = store.subscribe();
        drop(rx);
        store.append(Speaker::User, "still works");
        assert!(store.listeners.is_empty());
    }
}
