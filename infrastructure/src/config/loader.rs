//! Configuration file loader with multi-source merging

use super::file_config::{ConfigIssue, FileConfig};
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Project-level config file names, checked in order
const PROJECT_FILES: [&str; 2] = ["conclave.toml", ".conclave.toml"];

/// Prefix of environment overrides, e.g. `CONCLAVE_POOL__STRATEGY`
const ENV_PREFIX: &str = "CONCLAVE_";

/// Errors from loading configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read configuration: {0}")]
    Figment(#[from] Box<figment::Error>),

    #[error("Invalid configuration: {}", format_issues(.0))]
    Invalid(Vec<ConfigIssue>),
}

fn format_issues(issues: &[ConfigIssue]) -> String {
    issues
        .iter()
        .map(ConfigIssue::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Configuration loader that handles file discovery and merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from all sources with proper priority
    ///
    /// Priority (highest to lowest):
    /// 1. `CONCLAVE_` environment variables (`__` separates nesting)
    /// 2. Explicit config path (if provided)
    /// 3. Project root: `./conclave.toml` or `./.conclave.toml`
    /// 4. Global: `$XDG_CONFIG_HOME/conclave/config.toml`
    /// 5. Default values
    pub fn load(config_path: Option<&Path>) -> Result<FileConfig, ConfigError> {
        Self::load_from(
            Self::global_config_path().as_deref(),
            Path::new("."),
            config_path,
        )
    }

    /// Like [`load`](Self::load) with explicit global file and project
    /// directory.
    pub fn load_from(
        global: Option<&Path>,
        project_dir: &Path,
        config_path: Option<&Path>,
    ) -> Result<FileConfig, ConfigError> {
        let config: FileConfig = Self::figment(global, project_dir, config_path)
            .extract()
            .map_err(Box::new)?;

        let issues = config.validate();
        if !issues.is_empty() {
            return Err(ConfigError::Invalid(issues));
        }
        Ok(config)
    }

    fn figment(global: Option<&Path>, project_dir: &Path, config_path: Option<&Path>) -> Figment {
        let mut figment = Figment::new().merge(Serialized::defaults(FileConfig::default()));

        if let Some(global_path) = global
            && global_path.exists()
        {
            debug!("Loading global config from {}", global_path.display());
            figment = figment.merge(Toml::file(global_path));
        }

        if let Some(path) = Self::project_config_path(project_dir) {
            debug!("Loading project config from {}", path.display());
            figment = figment.merge(Toml::file(path));
        }

        if let Some(path) = config_path {
            debug!("Loading config from {}", path.display());
            figment = figment.merge(Toml::file(path));
        }

        figment.merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Load only default configuration
    pub fn load_defaults() -> FileConfig {
        FileConfig::default()
    }

    /// Get the global config file path
    ///
    /// `$XDG_CONFIG_HOME/conclave/config.toml` or the platform equivalent
    pub fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("conclave").join("config.toml"))
    }

    /// Get the project-level config file in `dir` (if it exists)
    pub fn project_config_path(dir: &Path) -> Option<PathBuf> {
        PROJECT_FILES
            .iter()
            .map(|name| dir.join(name))
            .find(|path| path.exists())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use conclave_domain::LoadBalancingStrategy;
    use std::fs;

    #[test]
    fn test_load_defaults() {
        let config = ConfigLoader::load_defaults();
        assert!(config.agents.is_empty());
        assert_eq!(config.council.size, 3);
    }

    #[test]
    fn test_global_config_path() {
        let path = ConfigLoader::global_config_path();
        assert!(path.is_some());
        assert!(path.unwrap().ends_with("conclave/config.toml"));
    }

    #[test]
    fn test_sources_merge_in_priority_order() {
        let dir = tempfile::tempdir().unwrap();
        let global = dir.path().join("global.toml");
        fs::write(&global, "[pool]\nstrategy = \"round-robin\"\n[council]\nsize = 7\n").unwrap();

        let project = dir.path().join("project");
        fs::create_dir(&project).unwrap();
        fs::write(project.join(".conclave.toml"), "[pool]\nstrategy = \"least-loaded\"\n").unwrap();

        let explicit = dir.path().join("explicit.toml");
        fs::write(&explicit, "[orchestrator]\nretry_attempts = 9\n").unwrap();

        let config =
            ConfigLoader::load_from(Some(&global), &project, Some(&explicit)).unwrap();

        assert_eq!(config.pool_config().strategy, LoadBalancingStrategy::LeastLoaded);
        assert_eq!(config.council.size, 7);
        assert_eq!(config.orchestrator.retry_attempts, 9);
    }

    #[test]
    fn test_project_file_preference() {
        let dir = tempfile::tempdir().unwrap();
        assert!(ConfigLoader::project_config_path(dir.path()).is_none());

        fs::write(dir.path().join(".conclave.toml"), "").unwrap();
        fs::write(dir.path().join("conclave.toml"), "").unwrap();
        assert_eq!(
            ConfigLoader::project_config_path(dir.path()).unwrap(),
            dir.path().join("conclave.toml")
        );
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let explicit = dir.path().join("bad.toml");
        fs::write(&explicit, "[orchestrator]\nparallel_fanout = 0\n").unwrap();

        let err = ConfigLoader::load_from(None, dir.path(), Some(&explicit)).unwrap_err();
        match err {
            ConfigError::Invalid(issues) => {
                assert_eq!(issues.len(), 1);
                assert_eq!(issues[0].field, "orchestrator.parallel_fanout");
            }
            other => panic!("expected Invalid, got {other}"),
        }
    }

    #[test]
    fn test_malformed_toml_is_a_figment_error() {
        let dir = tempfile::tempdir().unwrap();
        let explicit = dir.path().join("broken.toml");
        fs::write(&explicit, "[pool\nstrategy = ").unwrap();

        let err = ConfigLoader::load_from(None, dir.path(), Some(&explicit)).unwrap_err();
        assert!(matches!(err, ConfigError::Figment(_)));
    }
}
