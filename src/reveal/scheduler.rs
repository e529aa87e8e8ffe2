//! Reveal scheduler — streams tokens into a sink on a tokio task.
//!
//! Each reveal owns a [`CancellationToken`] and a phase cell.  Both the
//! streaming task and [`RevealHandle::cancel`] settle the phase while
//! holding the sink's lock, which gives two guarantees:
//!
//! 1. a reveal settles exactly once (`Finished` *or* `Cancelled`), and
//!    [`RevealSink::finish`] runs exactly once;
//! 2. when `cancel()` returns, no further append can reach the sink.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::markup::{Token, TokenKind};

use super::sink::{RevealSink, SharedSink};
use super::units::reveal_units;

// ---------------------------------------------------------------------------
// Phase / outcome
// ---------------------------------------------------------------------------

/// Where a reveal is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevealPhase {
    /// Nothing has been played yet.
    Idle,
    /// Units are being appended.
    Streaming,
    /// Every token was appended.
    Finished,
    /// Stopped early; the sink keeps what it had.
    Cancelled,
}

impl RevealPhase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, RevealPhase::Finished | RevealPhase::Cancelled)
    }
}

/// How a reveal ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevealOutcome {
    Finished,
    Cancelled,
}

impl From<RevealOutcome> for RevealPhase {
    fn from(outcome: RevealOutcome) -> Self {
        match outcome {
            RevealOutcome::Finished => RevealPhase::Finished,
            RevealOutcome::Cancelled => RevealPhase::Cancelled,
        }
    }
}

/// Identifies one `play()` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RevealId(u64);

// ---------------------------------------------------------------------------
// RevealControl — shared between task, handle and scheduler
// ---------------------------------------------------------------------------

#[derive(Debug)]
struct RevealControl {
    token: CancellationToken,
    phase: Mutex<RevealPhase>,
}

impl RevealControl {
    fn new() -> Self {
        Self {
            token: CancellationToken::new(),
            phase: Mutex::new(RevealPhase::Streaming),
        }
    }

    fn phase(&self) -> RevealPhase {
        *self.phase.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Leave `Streaming` for `outcome`.  Returns `false` when already settled.
    fn settle(&self, outcome: RevealOutcome) -> bool {
        let mut phase = self.phase.lock().unwrap_or_else(PoisonError::into_inner);
        if *phase != RevealPhase::Streaming {
            return false;
        }
        *phase = outcome.into();
        true
    }
}

fn lock_sink(sink: &SharedSink) -> MutexGuard<'_, dyn RevealSink + 'static> {
    sink.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Cancel `control` and settle it under the sink lock.
fn cancel_reveal(control: &RevealControl, sink: &SharedSink) -> bool {
    control.token.cancel();
    let mut guard = lock_sink(sink);
    if control.settle(RevealOutcome::Cancelled) {
        guard.finish();
        true
    } else {
        false
    }
}

// ---------------------------------------------------------------------------
// RevealHandle
// ---------------------------------------------------------------------------

/// Owner's view of one reveal.
///
/// Dropping the handle does not stop the reveal.
pub struct RevealHandle {
    id: RevealId,
    control: Arc<RevealControl>,
    sink: SharedSink,
    task: Option<JoinHandle<()>>,
}

impl std::fmt::Debug for RevealHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RevealHandle")
            .field("id", &self.id)
            .field("phase", &self.phase())
            .finish_non_exhaustive()
    }
}

impl RevealHandle {
    pub fn id(&self) -> RevealId {
        self.id
    }

    pub fn phase(&self) -> RevealPhase {
        self.control.phase()
    }

    /// `true` while units are still being appended.
    pub fn is_streaming(&self) -> bool {
        self.phase() == RevealPhase::Streaming
    }

    /// Stop the reveal now.  Returns `true` if this call ended it, `false`
    /// if it had already finished or been cancelled.
    pub fn cancel(&self) -> bool {
        cancel_reveal(&self.control, &self.sink)
    }

    /// Wait until the reveal settles and report how it ended.
    pub async fn wait(&mut self) -> RevealOutcome {
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                log::warn!("reveal: task {:?} ended abnormally: {e}", self.id);
                cancel_reveal(&self.control, &self.sink);
            }
        }
        match self.control.phase() {
            RevealPhase::Finished => RevealOutcome::Finished,
            _ => RevealOutcome::Cancelled,
        }
    }
}

// ---------------------------------------------------------------------------
// RevealScheduler
// ---------------------------------------------------------------------------

struct ActiveReveal {
    id: RevealId,
    control: Arc<RevealControl>,
    sink: SharedSink,
}

/// Plays token streams one at a time.
///
/// [`play`](Self::play) spawns onto the current tokio runtime, so it must be
/// called from within one.
#[derive(Default)]
pub struct RevealScheduler {
    active: Option<ActiveReveal>,
    next_id: u64,
}

impl RevealScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start revealing `tokens` into `sink`.
    ///
    /// A reveal still streaming is cancelled before this call spawns
    /// anything, so the previous reveal has settled by the time the new one
    /// appends its first unit.
    pub fn play(&mut self, tokens: Vec<Token>, sink: SharedSink, char_delay: Duration) -> RevealHandle {
        self.cancel();

        let id = RevealId(self.next_id);
        self.next_id += 1;

        let control = Arc::new(RevealControl::new());
        log::debug!("reveal: {id:?} streaming {} tokens", tokens.len());

        let task = tokio::spawn(stream_tokens(
            tokens,
            Arc::clone(&sink),
            Arc::clone(&control),
            char_delay,
        ));

        self.active = Some(ActiveReveal {
            id,
            control: Arc::clone(&control),
            sink: Arc::clone(&sink),
        });

        RevealHandle {
            id,
            control,
            sink,
            task: Some(task),
        }
    }

    /// Cancel the current reveal, if one is still streaming.  Returns `true`
    /// when something was cancelled.
    pub fn cancel(&self) -> bool {
        let Some(active) = self.active.as_ref() else {
            return false;
        };
        let cancelled = cancel_reveal(&active.control, &active.sink);
        if cancelled {
            log::debug!("reveal: {:?} cancelled", active.id);
        }
        cancelled
    }

    /// Phase of the most recent reveal; `Idle` before the first `play()`.
    pub fn phase(&self) -> RevealPhase {
        self.active
            .as_ref()
            .map(|a| a.control.phase())
            .unwrap_or(RevealPhase::Idle)
    }
}

// ---------------------------------------------------------------------------
// Streaming task
// ---------------------------------------------------------------------------

async fn stream_tokens(
    tokens: Vec<Token>,
    sink: SharedSink,
    control: Arc<RevealControl>,
    char_delay: Duration,
) {
    'tokens: for token in &tokens {
        match token.kind {
            TokenKind::Markup => {
                if !append_unit(&sink, &control, &token.value) {
                    break 'tokens;
                }
            }
            TokenKind::Text => {
                for unit in reveal_units(&token.value) {
                    if !append_unit(&sink, &control, unit) {
                        break 'tokens;
                    }
                    pause(&control.token, char_delay).await;
                }
            }
        }
    }

    let mut guard = lock_sink(&sink);
    let outcome = if control.token.is_cancelled() {
        RevealOutcome::Cancelled
    } else {
        RevealOutcome::Finished
    };
    if control.settle(outcome) {
        guard.finish();
    }
}

/// Append one unit unless the reveal was cancelled.  Returns `false` once
/// cancelled.
fn append_unit(sink: &SharedSink, control: &RevealControl, unit: &str) -> bool {
    let mut guard = lock_sink(sink);
    if control.token.is_cancelled() {
        return false;
    }
    if guard.is_attached() {
        guard.append(unit);
        guard.follow();
    }
    true
}

/// Wait `delay` (or just yield when zero), waking early on cancellation.
async fn pause(token: &CancellationToken, delay: Duration) {
    if delay.is_zero() {
        tokio::task::yield_now().await;
        return;
    }
    tokio::select! {
        _ = token.cancelled() => {}
        _ = tokio::time::sleep(delay) => {}
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
