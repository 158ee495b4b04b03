//! Logging configuration from TOML (`[logging]` section)

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Raw logging configuration from TOML
///
/// ```toml
/// [logging]
/// verbosity = 1                            # 0 = warn, 1 = info, 2 = debug, 3+ = trace
/// event_log = "~/.local/share/conclave/events.jsonl"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileLoggingConfig {
    pub verbosity: u8,
    /// JSONL event log; no file is written when unset
    pub event_log: Option<PathBuf>,
}
