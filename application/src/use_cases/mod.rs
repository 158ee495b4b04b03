//! Use cases
//!
//! Application-level operations that orchestrate domain logic.

pub mod agent_pool;
pub mod orchestrator;
pub mod run_council;
pub(crate) mod shared;
