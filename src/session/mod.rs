//! Chat session — wires the store, markup pipeline, reveal scheduler,
//! backend and audio into one controller.
//!
//! * [`ChatSession`] — owns the conversation and every stateful resource.
//! * [`ChatSurface`] — display the session reports to.
//! * [`AssistantMessage`] — maps a `/chat` outcome onto bubble text.
//!
//! # Quick start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use medchat::audio::{CpalMicrophone, CpalOutput};
//! use medchat::backend::HttpBackend;
//! use medchat::config::AppConfig;
//! use medchat::session::ChatSession;
//! use medchat::ui::TerminalSurface;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() {
//!     let config = AppConfig::default();
//!     let mut session = ChatSession::new(
//!         config.clone(),
//!         Arc::new(HttpBackend::from_config(&config.backend)),
//!         Arc::new(CpalOutput::new(None)),
//!         Arc::new(CpalMicrophone::new(None, config.voice.max_recording_secs)),
//!         Box::new(TerminalSurface::stdout()),
//!     );
//!
//!     session.send_message("Is paracetamol safe with coffee?").await;
//!     session.wait_reveal().await;
//! }
//! ```

pub mod controller;
pub mod reply;
pub mod surface;

pub use controller::ChatSession;
pub use reply::AssistantMessage;
pub use surface::ChatSurface;
