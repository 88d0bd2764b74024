pub mod config;
pub mod dataset;
pub mod engine;
pub mod error;
pub mod telemetry;
