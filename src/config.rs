//! Layered configuration with source tracking.
//!
//! Precedence (highest to lowest):
//! 1. CLI flags
//! 2. Environment variables (`DOCREFLECT_*`)
//! 3. Project config (`docreflect.json`, or the file named by `--config`)
//! 4. Defaults
//!
//! Path lists concatenate across layers, lowest layer first. Scalars take
//! the value of the highest layer that sets them.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{debug, warn};

use docreflect_core::{ProviderOptions, RegistryOptions};

use crate::loader::LoadError;

/// Default project config file name, looked up in the working directory.
pub const PROJECT_CONFIG_FILE: &str = "docreflect.json";

/// Path-list of extra stub files (platform path separator).
pub const ENV_STUBS: &str = "DOCREFLECT_STUBS";
/// `0`/`1` toggle for the resolution cache.
pub const ENV_CACHE: &str = "DOCREFLECT_CACHE";
/// `0`/`1` toggle for hierarchy validation at registry build.
pub const ENV_VALIDATE_HIERARCHY: &str = "DOCREFLECT_VALIDATE_HIERARCHY";

// ============================================================================
// Configuration Sources
// ============================================================================

/// Configuration value source (for precedence tracking).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ConfigSource {
    /// Built-in default value.
    Default = 0,
    /// From the project config file.
    ProjectConfig = 1,
    /// From environment variable.
    EnvVar = 2,
    /// From CLI flag (highest precedence).
    CliFlag = 3,
}

/// A configuration value with its source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigValue<T> {
    /// The actual value.
    pub value: T,
    /// Where the value came from.
    pub source: ConfigSource,
}

impl<T> ConfigValue<T> {
    /// Create a new config value with the given source.
    pub fn new(value: T, source: ConfigSource) -> Self {
        ConfigValue { value, source }
    }

    /// Merge with another value, preferring higher precedence.
    pub fn merge(self, other: Self) -> Self {
        if other.source >= self.source {
            other
        } else {
            self
        }
    }
}

// ============================================================================
// Project Config File
// ============================================================================

/// Contents of `docreflect.json`.
///
/// Relative paths are resolved against the directory holding the file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProjectConfig {
    pub source_facts: Vec<PathBuf>,
    pub native_facts: Vec<PathBuf>,
    pub stub_files: Vec<PathBuf>,
    pub stub_dirs: Vec<PathBuf>,
    pub cache: Option<bool>,
    pub validate_hierarchy: Option<bool>,
}

impl ProjectConfig {
    /// Read a project config file.
    pub fn read(path: &Path) -> Result<Self, LoadError> {
        let text = fs::read_to_string(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| LoadError::Json {
            path: path.to_path_buf(),
            source,
        })
    }
}

// ============================================================================
// CLI Overrides
// ============================================================================

/// CLI configuration overrides.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    /// --config flag.
    pub config_file: Option<PathBuf>,
    /// --source flags.
    pub source_facts: Vec<PathBuf>,
    /// --native flags.
    pub native_facts: Vec<PathBuf>,
    /// --stubs flags.
    pub stub_files: Vec<PathBuf>,
    /// --stub-dir flags.
    pub stub_dirs: Vec<PathBuf>,
    /// --no-cache flag.
    pub cache: Option<bool>,
    /// --no-validate-hierarchy flag.
    pub validate_hierarchy: Option<bool>,
}

// ============================================================================
// Configuration Resolution
// ============================================================================

/// Resolved configuration with precedence information.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    /// Source-producer fact files.
    pub source_facts: Vec<ConfigValue<PathBuf>>,
    /// Native-producer fact files.
    pub native_facts: Vec<ConfigValue<PathBuf>>,
    /// Stub fact files.
    pub stub_files: Vec<ConfigValue<PathBuf>>,
    /// Directories scanned recursively for stub fact files.
    pub stub_dirs: Vec<ConfigValue<PathBuf>>,
    /// Resolution cache toggle.
    pub cache: ConfigValue<bool>,
    /// Hierarchy validation toggle.
    pub validate_hierarchy: ConfigValue<bool>,
}

impl Default for ResolvedConfig {
    fn default() -> Self {
        ResolvedConfig {
            source_facts: Vec::new(),
            native_facts: Vec::new(),
            stub_files: Vec::new(),
            stub_dirs: Vec::new(),
            cache: ConfigValue::new(true, ConfigSource::Default),
            validate_hierarchy: ConfigValue::new(true, ConfigSource::Default),
        }
    }
}

impl ResolvedConfig {
    /// Resolve configuration from all sources, reading the process
    /// environment.
    pub fn resolve(working_dir: &Path, cli_overrides: &CliOverrides) -> Result<Self, LoadError> {
        Self::resolve_with_env(working_dir, cli_overrides, |key| std::env::var(key).ok())
    }

    /// Resolve configuration with an explicit environment lookup.
    pub fn resolve_with_env(
        working_dir: &Path,
        cli_overrides: &CliOverrides,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, LoadError> {
        // Defaults (lowest precedence)
        let mut config = ResolvedConfig::default();

        match &cli_overrides.config_file {
            Some(path) => {
                let path = working_dir.join(path);
                config.apply_project_config(&ProjectConfig::read(&path)?, &path);
            }
            None => {
                let path = working_dir.join(PROJECT_CONFIG_FILE);
                if path.is_file() {
                    config.apply_project_config(&ProjectConfig::read(&path)?, &path);
                }
            }
        }

        config.apply_env_vars(working_dir, env);

        // CLI overrides (highest precedence)
        config.apply_cli_overrides(working_dir, cli_overrides);

        Ok(config)
    }

    fn apply_project_config(&mut self, project: &ProjectConfig, path: &Path) {
        debug!(path = %path.display(), "applying project config");
        let base = path.parent().unwrap_or(Path::new("."));
        let source = ConfigSource::ProjectConfig;

        push_paths(&mut self.source_facts, base, &project.source_facts, source);
        push_paths(&mut self.native_facts, base, &project.native_facts, source);
        push_paths(&mut self.stub_files, base, &project.stub_files, source);
        push_paths(&mut self.stub_dirs, base, &project.stub_dirs, source);

        if let Some(cache) = project.cache {
            self.set_cache(ConfigValue::new(cache, source));
        }
        if let Some(validate) = project.validate_hierarchy {
            self.set_validate_hierarchy(ConfigValue::new(validate, source));
        }
    }

    fn apply_env_vars(&mut self, working_dir: &Path, env: impl Fn(&str) -> Option<String>) {
        if let Some(stubs) = env(ENV_STUBS) {
            let paths: Vec<PathBuf> = std::env::split_paths(&stubs)
                .filter(|p| !p.as_os_str().is_empty())
                .collect();
            push_paths(&mut self.stub_files, working_dir, &paths, ConfigSource::EnvVar);
        }

        if let Some(cache) = env(ENV_CACHE).and_then(|v| parse_flag(ENV_CACHE, &v)) {
            self.set_cache(ConfigValue::new(cache, ConfigSource::EnvVar));
        }

        if let Some(validate) =
            env(ENV_VALIDATE_HIERARCHY).and_then(|v| parse_flag(ENV_VALIDATE_HIERARCHY, &v))
        {
            self.set_validate_hierarchy(ConfigValue::new(validate, ConfigSource::EnvVar));
        }
    }

    fn apply_cli_overrides(&mut self, working_dir: &Path, overrides: &CliOverrides) {
        let source = ConfigSource::CliFlag;
        push_paths(&mut self.source_facts, working_dir, &overrides.source_facts, source);
        push_paths(&mut self.native_facts, working_dir, &overrides.native_facts, source);
        push_paths(&mut self.stub_files, working_dir, &overrides.stub_files, source);
        push_paths(&mut self.stub_dirs, working_dir, &overrides.stub_dirs, source);

        if let Some(cache) = overrides.cache {
            self.set_cache(ConfigValue::new(cache, source));
        }
        if let Some(validate) = overrides.validate_hierarchy {
            self.set_validate_hierarchy(ConfigValue::new(validate, source));
        }
    }

    fn set_cache(&mut self, value: ConfigValue<bool>) {
        self.cache = self.cache.clone().merge(value);
    }

    fn set_validate_hierarchy(&mut self, value: ConfigValue<bool>) {
        self.validate_hierarchy = self.validate_hierarchy.clone().merge(value);
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn source_fact_paths(&self) -> Vec<&Path> {
        values(&self.source_facts)
    }

    pub fn native_fact_paths(&self) -> Vec<&Path> {
        values(&self.native_facts)
    }

    pub fn stub_file_paths(&self) -> Vec<&Path> {
        values(&self.stub_files)
    }

    pub fn stub_dir_paths(&self) -> Vec<&Path> {
        values(&self.stub_dirs)
    }

    /// Registry construction options.
    pub fn registry_options(&self) -> RegistryOptions {
        RegistryOptions {
            validate_hierarchy: self.validate_hierarchy.value,
        }
    }

    /// Provider construction options.
    pub fn provider_options(&self) -> ProviderOptions {
        ProviderOptions {
            cache: self.cache.value,
        }
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

fn push_paths(
    target: &mut Vec<ConfigValue<PathBuf>>,
    base: &Path,
    paths: &[PathBuf],
    source: ConfigSource,
) {
    target.extend(paths.iter().map(|p| ConfigValue::new(base.join(p), source)));
}

fn values(list: &[ConfigValue<PathBuf>]) -> Vec<&Path> {
    list.iter().map(|v| v.value.as_path()).collect()
}

/// Parse a boolean environment toggle. Unrecognized values are ignored.
fn parse_flag(name: &str, value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => {
            warn!(variable = name, value, "ignoring unrecognized boolean value");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    mod config_value_tests {
        use super::*;

        #[test]
        fn merge_prefers_higher_source() {
            let low = ConfigValue::new(1, ConfigSource::ProjectConfig);
            let high = ConfigValue::new(2, ConfigSource::CliFlag);
            assert_eq!(low.clone().merge(high.clone()).value, 2);
            assert_eq!(high.merge(low).value, 2);
        }
    }

    mod resolve_tests {
        use super::*;

        #[test]
        fn defaults_without_any_layer() {
            let dir = tempfile::tempdir().unwrap();
            let config =
                ResolvedConfig::resolve_with_env(dir.path(), &CliOverrides::default(), env(&[]))
                    .unwrap();
            assert!(config.cache.value);
            assert_eq!(config.cache.source, ConfigSource::Default);
            assert!(config.validate_hierarchy.value);
            assert!(config.source_facts.is_empty());
        }

        #[test]
        fn project_file_paths_are_relative_to_file() {
            let dir = tempfile::tempdir().unwrap();
            fs::write(
                dir.path().join(PROJECT_CONFIG_FILE),
                r#"{ "source_facts": ["facts/source.json"], "cache": false }"#,
            )
            .unwrap();

            let config =
                ResolvedConfig::resolve_with_env(dir.path(), &CliOverrides::default(), env(&[]))
                    .unwrap();
            assert_eq!(
                config.source_fact_paths(),
                vec![dir.path().join("facts/source.json").as_path()]
            );
            assert!(!config.cache.value);
            assert_eq!(config.cache.source, ConfigSource::ProjectConfig);
        }

        #[test]
        fn explicit_config_file_must_exist() {
            let dir = tempfile::tempdir().unwrap();
            let overrides = CliOverrides {
                config_file: Some(PathBuf::from("missing.json")),
                ..Default::default()
            };
            let err = ResolvedConfig::resolve_with_env(dir.path(), &overrides, env(&[]))
                .unwrap_err();
            assert!(matches!(err, LoadError::Io { .. }));
        }

        #[test]
        fn unknown_project_keys_are_rejected() {
            let dir = tempfile::tempdir().unwrap();
            fs::write(dir.path().join(PROJECT_CONFIG_FILE), r#"{ "stubs": [] }"#).unwrap();
            let err =
                ResolvedConfig::resolve_with_env(dir.path(), &CliOverrides::default(), env(&[]))
                    .unwrap_err();
            assert!(matches!(err, LoadError::Json { .. }));
        }

        #[test]
        fn cli_overrides_env_overrides_project() {
            let dir = tempfile::tempdir().unwrap();
            fs::write(
                dir.path().join(PROJECT_CONFIG_FILE),
                r#"{ "cache": true, "validate_hierarchy": true, "stub_files": ["a.json"] }"#,
            )
            .unwrap();

            let overrides = CliOverrides {
                cache: Some(true),
                stub_files: vec![PathBuf::from("c.json")],
                ..Default::default()
            };
            let config = ResolvedConfig::resolve_with_env(
                dir.path(),
                &overrides,
                env(&[
                    (ENV_CACHE, "0"),
                    (ENV_VALIDATE_HIERARCHY, "false"),
                    (ENV_STUBS, "b.json"),
                ]),
            )
            .unwrap();

            assert!(config.cache.value);
            assert_eq!(config.cache.source, ConfigSource::CliFlag);
            assert!(!config.validate_hierarchy.value);
            assert_eq!(config.validate_hierarchy.source, ConfigSource::EnvVar);

            let sources: Vec<_> = config.stub_files.iter().map(|v| v.source).collect();
            assert_eq!(
                sources,
                vec![
                    ConfigSource::ProjectConfig,
                    ConfigSource::EnvVar,
                    ConfigSource::CliFlag
                ]
            );
            assert!(!config.registry_options().validate_hierarchy);
            assert!(config.provider_options().cache);
        }

        #[test]
        fn unrecognized_env_flag_is_ignored() {
            let dir = tempfile::tempdir().unwrap();
            let config = ResolvedConfig::resolve_with_env(
                dir.path(),
                &CliOverrides::default(),
                env(&[(ENV_CACHE, "maybe")]),
            )
            .unwrap();
            assert!(config.cache.value);
            assert_eq!(config.cache.source, ConfigSource::Default);
        }
    }
}
