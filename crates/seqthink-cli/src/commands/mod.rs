pub mod api;
pub mod output;
pub mod session;
pub mod sessions;
