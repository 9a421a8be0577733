pub mod auth_cmd;
pub mod common;
pub mod completions;
pub mod config;
pub mod drafts;
pub mod export;
pub mod history;
pub mod retry;
pub mod submit;
