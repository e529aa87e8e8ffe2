//! Medchat — chat client for a medical assistant backend.
//!
//! The crate renders conversation turns incrementally ("typing" reveal),
//! forwards typed or recorded input to a remote assistant, and plays the
//! synthesized speech of assistant replies.
//!
//! # Modules
//!
//! | Module | Responsibility |
//! |--------|----------------|
//! | [`conversation`] | Append-only conversation log and reveal lifecycle |
//! | [`markup`] | Markdown → tag-aware token stream |
//! | [`reveal`] | Cancellable character-by-character reveal |
//! | [`backend`] | `/chat`, `/speak`, `/voice` client |
//! | [`audio`] | Microphone capture, WAV encoding, speech playback |
//! | [`session`] | Controller wiring everything together |
//! | [`ui`] | Terminal display surface |
//! | [`config`] | TOML settings |

pub mod audio;
pub mod backend;
pub mod config;
pub mod conversation;
pub mod markup;
pub mod reveal;
pub mod session;
pub mod ui;
