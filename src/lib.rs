pub mod analytics;
pub mod api;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod platform;
pub mod relay;
pub mod server;
pub mod shutdown;
