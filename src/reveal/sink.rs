//! Display surfaces a reveal writes into.

use std::sync::{Arc, Mutex};

// ---------------------------------------------------------------------------
// RevealSink trait
// ---------------------------------------------------------------------------

/// The node/region receiving revealed content.
///
/// The scheduler holds the sink's lock for each single append, never across
/// a timer wait.
pub trait RevealSink: Send {
    /// Append one markup fragment or one text unit.
    fn append(&mut self, fragment: &str);

    /// Keep the newest content in view.  Called after every append.
    fn follow(&mut self) {}

    /// The reveal ended (finished or cancelled): drop the typing cursor and
    /// scroll to the latest content.  Called exactly once per reveal.
    fn finish(&mut self) {}

    /// `false` once the sink was removed from the display; appends to a
    /// detached sink are skipped.
    fn is_attached(&self) -> bool {
        true
    }
}

/// Sink shared between the scheduler's task and its owner.
pub type SharedSink = Arc<Mutex<dyn RevealSink>>;

/// Wrap `sink` for use with [`RevealScheduler`](super::RevealScheduler).
pub fn shared_sink<S: RevealSink + 'static>(sink: S) -> Arc<Mutex<S>> {
    Arc::new(Mutex::new(sink))
}

// ---------------------------------------------------------------------------
// BufferSink
// ---------------------------------------------------------------------------

/// In-memory sink that keeps the revealed markup and, optionally, a snapshot
/// after every append.
#[derive(Debug, Default, Clone)]
pub struct BufferSink {
    content: String,
    snapshots: Option<Vec<String>>,
    finish_count: usize,
    detached: bool,
}

impl BufferSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// A sink that records its content after every append.
    pub fn recording() -> Self {
        Self {
            snapshots: Some(Vec::new()),
            ..Self::default()
        }
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    /// Content after each append, oldest first.  Empty unless created with
    /// [`BufferSink::recording`].
    pub fn snapshots(&self) -> &[String] {
        self.snapshots.as_deref().unwrap_or(&[])
    }

    pub fn is_finished(&self) -> bool {
        self.finish_count > 0
    }

    pub fn finish_count(&self) -> usize {
        self.finish_count
    }

    /// Remove the sink from the display.
    pub fn detach(&mut self) {
        self.detached = true;
    }
}

impl RevealSink for BufferSink {
    fn append(&mut self, fragment: &str) {
        self.content.push_str(fragment);
        if let Some(snapshots) = self.snapshots.as_mut() {
            snapshots.push(self.content.clone());
        }
    }

    fn finish(&mut self) {
        self.finish_count += 1;
    }

    fn is_attached(&self) -> bool {
        !self.detached
    }
}
