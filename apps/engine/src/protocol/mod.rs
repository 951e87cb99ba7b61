//! Read-only shapes handed to the presentation collaborator.

pub mod events;
pub mod match_view;

pub use events::PresenceEvent;
pub use match_view::{MatchResultView, MatchSessionView};
