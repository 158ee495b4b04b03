//! Infrastructure layer for conclave
//!
//! This crate contains adapters for the ports defined in the application
//! layer: configuration file loading, `tracing` setup and the JSONL event
//! log.

pub mod config;
pub mod logging;

// Re-export commonly used types
pub use config::{
    ConfigError, ConfigIssue, ConfigLoader, FileAgentDefinition, FileConfig, FileCouncilConfig,
    FileLoggingConfig, FileOrchestratorConfig, FilePoolConfig,
};
pub use logging::{JsonlEventLogger, init_tracing};
