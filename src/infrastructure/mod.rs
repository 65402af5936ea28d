pub mod audit;
pub mod cache;
pub mod config;
pub mod metrics;
pub mod persistence;
pub mod processor;
pub mod resilience;
pub mod workers;
