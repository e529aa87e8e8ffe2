//! Backend contract: the `/chat`, `/speak` and `/voice` endpoints.
//!
//! * [`AssistantBackend`] — async trait the session talks to.
//! * [`HttpBackend`] — reqwest implementation configured from
//!   [`BackendConfig`](crate::config::BackendConfig).
//! * [`ChatReply`] — `{response}` / `{error}` / nothing.
//! * [`BackendError`] — transport, timeout, status and parse failures.
//!
//! # Quick start
//!
//! ```rust,no_run
//! use medchat::backend::{AssistantBackend, ChatReply, HttpBackend};
//! use medchat::config::AppConfig;
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = AppConfig::default();
//!     let backend = HttpBackend::from_config(&config.backend);
//!
//!     match backend.chat("Can I take ibuprofen with food?").await {
//!         Ok(ChatReply::Response(text)) => println!("{text}"),
//!         Ok(other) => println!("{other:?}"),
//!         Err(e) => eprintln!("{e}"),
//!     }
//! }
//! ```

pub mod client;
pub mod error;

pub use client::{AssistantBackend, ChatReply, HttpBackend};
pub use error::BackendError;
