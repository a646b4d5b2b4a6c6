pub mod client;
pub mod config;
pub mod display;
pub mod errors;
pub mod executor;
pub mod payload;
pub mod report;
pub mod runner;
pub mod stats;
pub mod types;
