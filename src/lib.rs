pub mod classifier;
pub mod config;
pub mod error;
pub mod fix;
pub mod platform;
pub mod report;
pub mod resolver;
pub mod shutdown;
