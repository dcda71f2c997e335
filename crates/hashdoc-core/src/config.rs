//! Project configuration (`hashdoc.toml`) parsing and validation.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Name of the configuration file looked up at the project root.
pub const CONFIG_FILE_NAME: &str = "hashdoc.toml";

/// Placeholder in the test command replaced by the module's library root.
pub const LIB_PLACEHOLDER: &str = "{lib}";

/// Placeholder in the test command replaced by the synthesized script path.
pub const SCRIPT_PLACEHOLDER: &str = "{script}";

/// Errors that can occur when loading a configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(&'static str),
}

/// The complete hashdoc.toml configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Extraction settings.
    #[serde(default)]
    pub extract: ExtractConfig,

    /// Test runner settings.
    #[serde(default)]
    pub test: TestConfig,
}

/// `[extract]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "kebab-case")]
pub struct ExtractConfig {
    /// Imported module names that enable attribute and modifier items.
    pub extensions: Vec<String>,

    /// File extensions treated as source modules.
    pub source_extensions: Vec<String>,

    /// File extensions treated as plain documents.
    pub document_extensions: Vec<String>,

    /// Directory names never descended into.
    pub exclude_dirs: Vec<String>,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            extensions: [
                "Moose",
                "Moose::Role",
                "Moo",
                "Moo::Role",
                "Mouse",
                "Mouse::Role",
                "Role::Tiny",
            ]
            .map(String::from)
            .to_vec(),
            source_extensions: vec![String::from("pm"), String::from("pl")],
            document_extensions: vec![String::from("md")],
            exclude_dirs: ["blib", "local", "target"].map(String::from).to_vec(),
        }
    }
}

impl ExtractConfig {
    /// Whether `path` carries one of the source extensions.
    pub fn is_source(&self, path: &Path) -> bool {
        has_extension(path, &self.source_extensions)
    }

    /// Whether `path` carries one of the document extensions.
    pub fn is_document(&self, path: &Path) -> bool {
        has_extension(path, &self.document_extensions)
    }

    /// Whether a directory with this name is skipped during discovery.
    pub fn is_excluded_dir(&self, name: &str) -> bool {
        self.exclude_dirs.iter().any(|dir| dir == name)
    }
}

fn has_extension(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| extensions.iter().any(|e| e == ext))
}

/// `[test]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "kebab-case")]
pub struct TestConfig {
    /// Runner program and arguments, with `{lib}` and `{script}` placeholders.
    pub command: Vec<String>,

    /// Seconds a single runner invocation may take; `0` waits forever.
    pub timeout_secs: u64,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            command: ["prove", "-I", LIB_PLACEHOLDER, SCRIPT_PLACEHOLDER]
                .map(String::from)
                .to_vec(),
            timeout_secs: 300,
        }
    }
}

impl TestConfig {
    /// Runner timeout, `None` when disabled.
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs))
    }
}

impl Config {
    /// Load a configuration from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed or validated.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parse a configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is invalid or fails validation.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load `hashdoc.toml` from `root`, falling back to defaults when absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but is unreadable or invalid.
    pub fn load(root: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = root.as_ref().join(CONFIG_FILE_NAME);
        if path.is_file() {
            Self::from_path(path)
        } else {
            Ok(Self::default())
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let command = &self.test.command;
        if command.is_empty() {
            return Err(ConfigError::Invalid("test command cannot be empty"));
        }
        if command[0].trim().is_empty() {
            return Err(ConfigError::Invalid("test command program cannot be blank"));
        }
        if !command.iter().any(|arg| arg.contains(SCRIPT_PLACEHOLDER)) {
            return Err(ConfigError::Invalid(
                "test command must reference the {script} placeholder",
            ));
        }
        Ok(())
    }
}
