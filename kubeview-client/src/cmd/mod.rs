pub mod config;
pub mod get;
pub mod log_session;
pub mod logs;
