pub mod config_service;
pub mod json_session_repository;
pub mod paths;
pub mod storage;

pub use crate::config_service::ConfigService;
pub use crate::json_session_repository::JsonSessionRepository;
pub use crate::paths::SeqThinkPaths;
