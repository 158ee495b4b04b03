//! Application-level configuration.
//!
//! - [`PoolConfig`]: agent selection policy
//! - [`OrchestratorConfig`]: retries, waiting, fan-out
//! - [`CouncilConfig`]: council size and fallback behavior

pub mod council_config;
pub mod orchestrator_config;
pub mod pool_config;

pub use council_config::CouncilConfig;
pub use orchestrator_config::OrchestratorConfig;
pub use pool_config::PoolConfig;
