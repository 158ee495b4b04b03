//! Council configuration from TOML (`[council]` section)

use super::ConfigIssue;
use conclave_application::CouncilConfig;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Raw council configuration from TOML
///
/// ```toml
/// [council]
/// size = 3
/// merge_top_k = 2
/// member_timeout_seconds = 180    # 0 for no limit
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileCouncilConfig {
    pub size: usize,
    pub merge_top_k: usize,
    pub member_timeout_seconds: u64,
}

impl Default for FileCouncilConfig {
    fn default() -> Self {
        let defaults = CouncilConfig::default();
        Self {
            size: defaults.size,
            merge_top_k: defaults.merge_top_k,
            member_timeout_seconds: defaults.member_timeout.map_or(0, |t| t.as_secs()),
        }
    }
}

impl FileCouncilConfig {
    pub fn to_council_config(&self) -> (CouncilConfig, Vec<ConfigIssue>) {
        let mut config = CouncilConfig::default();
        let mut issues = Vec::new();

        if self.size == 0 {
            issues.push(ConfigIssue::new("council.size", "council size cannot be 0"));
        } else {
            config = config.with_size(self.size);
        }

        if self.merge_top_k == 0 {
            issues.push(ConfigIssue::new("council.merge_top_k", "merge_top_k cannot be 0"));
        } else {
            config = config.with_merge_top_k(self.merge_top_k);
        }

        let timeout = Some(self.member_timeout_seconds)
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs);
        config = config.with_member_timeout(timeout);

        (config, issues)
    }
}
