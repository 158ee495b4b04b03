//! Council configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Controls [`CouncilUseCase`](crate::use_cases::run_council::CouncilUseCase).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CouncilConfig {
    /// Members acquired by `convene`
    pub size: usize,
    /// Candidates combined by the local merge-top fallback
    pub merge_top_k: usize,
    /// Per-call executor timeout for every stage
    pub member_timeout: Option<Duration>,
}

impl Default for CouncilConfig {
    fn default() -> Self {
        Self {
            size: 3,
            merge_top_k: 2,
            member_timeout: Some(Duration::from_secs(180)),
        }
    }
}

impl CouncilConfig {
    pub fn with_size(mut self, size: usize) -> Self {
        self.size = size;
        self
    }

    pub fn with_merge_top_k(mut self, k: usize) -> Self {
        self.merge_top_k = k;
        self
    }

    pub fn with_member_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.member_timeout = timeout;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_and_builder() {
        let config = CouncilConfig::default();
        assert_eq!(config.size, 3);
        assert_eq!(config.merge_top_k, 2);

        let config = config.with_size(5).with_member_timeout(None);
        assert_eq!(config.size, 5);
        assert!(config.member_timeout.is_none());
    }
}
