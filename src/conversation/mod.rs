//! Conversation log — the single source of truth for what is displayed.
//!
//! ```text
//! append(User)       ──▶ Turn { Complete }
//! append(Assistant)  ──▶ Turn { Pending }
//!                           │ begin_reveal(tokens)
//!                           ▼
//!                        Revealing ──complete_reveal──▶ Complete
//! ```
//!
//! [`MessageStore`] owns the ordered [`Turn`]s and broadcasts a
//! [`StoreEvent`] for every append and reveal transition to anyone who
//! called [`MessageStore::subscribe`].
//!
//! # Quick start
//!
//! ```rust
//! use medchat::conversation::{MessageStore, RevealState, Speaker};
//! use medchat::markup::tokenize;
//!
//! let mut store = MessageStore::new();
//! store.append(Speaker::User, "Can I take ibuprofen?");
//! let reply = store.append(Speaker::Assistant, "Yes, <strong>with food</strong>.");
//!
//! store.begin_reveal(reply, tokenize("Yes, <strong>with food</strong>.")).unwrap();
//! store.complete_reveal(reply).unwrap();
//! assert_eq!(store.get(reply).unwrap().reveal_state(), RevealState::Complete);
//! ```

pub mod store;
pub mod turn;

pub use store::{MessageStore, StoreError, StoreEvent};
pub use turn::{RevealState, Speaker, Turn, TurnHandle};
