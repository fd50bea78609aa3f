//! Three-step labeling wizard.
//!
//! All state lives in [`WizardState`]. [`WizardState::update`] applies one
//! [`Message`] and returns the [`Effect`]s the runtime must carry out; it never
//! touches the network itself, so the whole flow is testable without a backend.

mod message;
mod state;


pub use message::{Effect, Message};
pub use state::{Notice, NoticeLevel, SelectedFile, Step, WizardState, clamp_cluster_count};
