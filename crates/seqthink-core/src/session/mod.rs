//! Reasoning sessions: the model, its mutation protocol and persistence seam.

pub mod model;
pub mod repository;
pub mod store;

pub use model::{
    Branch, MAIN_BRANCH, Session, SessionMetadata, SessionStatus, SessionSummary, Thought,
};
pub use repository::{SessionEntry, SessionLock, SessionRepository};
pub use store::ThoughtOptions;
