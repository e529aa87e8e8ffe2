//! Incremental "typing" reveal of a token stream onto a display sink.
//!
//! # State machine
//!
//! ```text
//! Idle ──play()──▶ Streaming ──last unit appended──▶ Finished
//!                      │
//!                      └──cancel() / newer play()──▶ Cancelled
//! ```
//!
//! * Markup tokens are appended whole, with no delay.
//! * Text tokens are appended one unit (a character, or a whole HTML
//!   entity) at a time, pausing `char_delay` after each unit.  The pause is a
//!   tokio timer, so the host loop keeps running between characters.
//! * At most one reveal streams at a time: [`RevealScheduler::play`]
//!   cancels the previous reveal synchronously before the new one starts.
//! * Once cancelled, nothing more is appended.  The sink keeps what it
//!   already received.
//!
//! # Quick start
//!
//! ```rust
//! use std::time::Duration;
//! use medchat::markup::tokenize;
//! use medchat::reveal::{shared_sink, BufferSink, RevealOutcome, RevealScheduler};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() {
//!     let sink = shared_sink(BufferSink::new());
//!     let mut scheduler = RevealScheduler::new();
//!
//!     let mut reveal = scheduler.play(
//!         tokenize("Take <strong>ibuprofen</strong>"),
//!         sink.clone(),
//!         Duration::from_millis(1),
//!     );
//!     assert_eq!(reveal.wait().await, RevealOutcome::Finished);
//! }
//! ```

pub mod scheduler;
pub mod sink;
pub mod units;

pub use scheduler::{RevealHandle, RevealId, RevealOutcome, RevealPhase, RevealScheduler};
pub use sink::{shared_sink, BufferSink, RevealSink, SharedSink};
pub use units::reveal_units;
