//! Core domain for sequential reasoning sessions.
//!
//! A [`Session`] holds an append-only log of numbered thoughts plus named
//! branches. [`SessionController`] is the single entry point that validates a
//! submission, applies it to the session and scores it with the heuristic
//! analyzer and recommendation engine.

pub mod analysis;
pub mod config;
pub mod controller;
pub mod error;
pub mod export;
pub mod session;
pub mod validation;

pub use controller::{SessionController, ThoughtOutcome, ThoughtResponse};
pub use error::{Result, SeqThinkError};
pub use session::{Session, SessionRepository, Thought, ThoughtOptions};
pub use validation::{ThoughtRequest, ValidationError};
