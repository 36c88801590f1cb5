pub mod analytics;
pub mod auth;
pub mod cli;
pub mod config;
pub mod fetch;
pub mod flatten;
pub mod http;
pub mod notify;
pub mod pii;
pub mod pipeline;
pub mod report;
pub mod storage;
pub mod table;
pub mod upload;
pub mod util;
