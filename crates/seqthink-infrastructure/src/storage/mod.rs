//! Crash-safe file primitives shared by the repositories.

pub mod atomic_json;

pub use atomic_json::{AtomicFileError, AtomicJsonFile, FileLock};
