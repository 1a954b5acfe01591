//! Application layer for seqthink.
//!
//! Use cases that load a session from a [`SessionRepository`], run it through
//! the core controller and store the result.
//!
//! [`SessionRepository`]: seqthink_core::session::SessionRepository

pub mod session;
pub mod session_usecase;

pub use session::SessionUpdater;
pub use session_usecase::{SessionUseCase, ThinkOptions};
