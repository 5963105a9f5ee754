//! Automation configuration
//!
//! All tool locations and the directory layout live in one explicit struct that is passed into the pipeline,
//! builder and harness. Tests point it at fixture directories; real runs load it from `automation.toml`.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use automation_core::{ExclusionReason, SkippedExample};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default config file name, looked up in the root directory.
pub const CONFIG_FILE_NAME: &str = "automation.toml";

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV_VAR: &str = "AUTOMATION_CONFIG";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config file '{}': {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// How the `args` value of a project manifest is handed to the program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ArgsMode {
    /// The whole value is one argument.
    #[default]
    Single,
    /// The value is split on whitespace.
    Whitespace,
}

/// When the artifact pipeline rebuilds plugin and support code before an instrumented compile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RebuildPolicy {
    /// Skip a stage whose sources are unchanged since it was built earlier in this process.
    #[default]
    OnChange,
    Always,
}

/// Program names (or paths) of the external tools.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ToolsConfig {
    pub mvn: String,
    pub javac: String,
    pub java: String,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            mvn: "mvn".to_string(),
            javac: "javac".to_string(),
            java: "java".to_string(),
        }
    }
}

/// One entry of the suite exclusion list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Exclusion {
    pub name: String,
    #[serde(default = "default_exclusion_reason")]
    pub reason: ExclusionReason,
    #[serde(default)]
    pub note: Option<String>,
}

fn default_exclusion_reason() -> ExclusionReason {
    ExclusionReason::Manual
}

impl Exclusion {
    pub fn new(name: impl Into<String>, reason: ExclusionReason) -> Self {
        Self {
            name: name.into(),
            reason,
            note: None,
        }
    }

    pub fn to_skipped(&self) -> SkippedExample {
        SkippedExample {
            example: self.name.clone(),
            reason: self.reason,
            note: self.note.clone(),
        }
    }
}

/// Automation configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AutomationConfig {
    /// Directory every relative path below resolves against. Not read from the file.
    #[serde(skip)]
    pub root: PathBuf,
    pub examples_dir: PathBuf,
    pub plugin_dir: PathBuf,
    pub injected_dir: PathBuf,
    pub injectedgen_dir: PathBuf,
    /// Where the suite writes compiled classes and captured output.
    pub captures_dir: PathBuf,
    /// Name passed to `-Xplugin:`.
    pub plugin_name: String,
    /// Extra argument given to the generator run in test mode.
    pub generator_test_flag: String,
    pub tools: ToolsConfig,
    pub args_mode: ArgsMode,
    pub rebuild: RebuildPolicy,
    /// Kill any external step running longer than this. `None` waits forever.
    pub step_timeout_secs: Option<u64>,
    /// Keep captures of passing examples instead of deleting them.
    pub keep_captures: bool,
    pub exclude: Vec<Exclusion>,
}

impl Default for AutomationConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            examples_dir: PathBuf::from("examples"),
            plugin_dir: PathBuf::from("jumbotrace-plugin"),
            injected_dir: PathBuf::from("jumbotrace-injected"),
            injectedgen_dir: PathBuf::from("jumbotrace-injectedgen"),
            captures_dir: PathBuf::from("target/automation"),
            plugin_name: "JumboTrace".to_string(),
            generator_test_flag: "-Djumbotrace.testmode=true".to_string(),
            tools: ToolsConfig::default(),
            args_mode: ArgsMode::default(),
            rebuild: RebuildPolicy::default(),
            step_timeout_secs: None,
            keep_captures: false,
            exclude: Vec::new(),
        }
    }
}

impl AutomationConfig {
    /// Create a config with default settings rooted at `root`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ..Self::default()
        }
    }

    /// Parse TOML text; the root is left at its default.
    pub fn from_toml_str(text: &str, origin: &Path) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|source| ConfigError::Parse {
            path: origin.to_path_buf(),
            source,
        })
    }

    /// Load the configuration for `root`.
    ///
    /// Lookup order: `explicit`, then `$AUTOMATION_CONFIG`, then `<root>/automation.toml`, then defaults.
    pub fn load(root: &Path, explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let from_env = env::var_os(CONFIG_ENV_VAR).map(PathBuf::from);
        let candidate = explicit.map(Path::to_path_buf).or(from_env);

        let path = match candidate {
            Some(path) => Some(path),
            None => {
                let default_path = root.join(CONFIG_FILE_NAME);
                default_path.is_file().then_some(default_path)
            }
        };

        let mut config = match path {
            Some(path) => {
                let text = fs::read_to_string(&path).map_err(|source| ConfigError::Read {
                    path: path.clone(),
                    source,
                })?;
                tracing::debug!(path = %path.display(), "loaded automation config");
                Self::from_toml_str(&text, &path)?
            }
            None => Self::default(),
        };
        config.root = root.to_path_buf();
        Ok(config)
    }

    /// Set the root directory
    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = root.into();
        self
    }

    /// Add an exclusion entry
    pub fn with_exclusion(mut self, exclusion: Exclusion) -> Self {
        self.exclude.push(exclusion);
        self
    }

    /// Set the rebuild policy
    pub fn with_rebuild(mut self, rebuild: RebuildPolicy) -> Self {
        self.rebuild = rebuild;
        self
    }

    /// Set the manifest argument mode
    pub fn with_args_mode(mut self, mode: ArgsMode) -> Self {
        self.args_mode = mode;
        self
    }

    /// Resolve a configured path against the root.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }

    pub fn examples_root(&self) -> PathBuf {
        self.resolve(&self.examples_dir)
    }

    pub fn plugin_root(&self) -> PathBuf {
        self.resolve(&self.plugin_dir)
    }

    pub fn injected_root(&self) -> PathBuf {
        self.resolve(&self.injected_dir)
    }

    pub fn injectedgen_root(&self) -> PathBuf {
        self.resolve(&self.injectedgen_dir)
    }

    pub fn captures_root(&self) -> PathBuf {
        self.resolve(&self.captures_dir)
    }

    pub fn example_dir(&self, name: &str) -> PathBuf {
        self.examples_root().join(name)
    }

    pub fn step_timeout(&self) -> Option<Duration> {
        self.step_timeout_secs.map(Duration::from_secs)
    }

    /// The exclusion entry for an example, if it is excluded.
    pub fn exclusion_for(&self, name: &str) -> Option<&Exclusion> {
        self.exclude.iter().find(|e| e.name == name)
    }
}
