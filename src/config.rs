//! Implementation of the configuration module.
//!
//! Configuration is layered: the defaults, then a TOML file, then
//! environment variables prefixed with `WDLPARSE_` (sections are separated by
//! a double underscore, as in `WDLPARSE_PARSE__FORMAT=json`). Command line
//! arguments are applied last by each command.

use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;
use wdlparse_analysis::OutputFormat;

/// The name of the configuration file searched for in the working directory.
pub const CONFIG_FILE_NAME: &str = "wdlparse.toml";

/// The prefix of configuration environment variables.
const ENV_PREFIX: &str = "WDLPARSE";

/// An error loading or writing the configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// An explicitly requested configuration file does not exist.
    #[error("configuration file `{path}` does not exist", path = .0.display())]
    NotFound(PathBuf),
    /// The configuration could not be loaded.
    #[error("failed to load configuration")]
    Load(#[from] config::ConfigError),
    /// The configuration could not be serialized.
    #[error("failed to serialize configuration")]
    Serialize(#[from] toml::ser::Error),
}

/// Represents the configuration for the `wdlparse` tool.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", deny_unknown_fields, default)]
pub struct Config {
    /// Common configuration options for all commands.
    pub common: CommonConfig,
    /// Configuration for the `parse` command.
    pub parse: ParseConfig,
}

/// Represents shared configuration options for `wdlparse` commands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", deny_unknown_fields, default)]
pub struct CommonConfig {
    /// Display color output.
    pub color: bool,
    /// Extract basic metadata alongside each parse.
    pub extract_metadata: bool,
}

impl Default for CommonConfig {
    fn default() -> Self {
        Self {
            color: true,
            extract_metadata: false,
        }
    }
}

/// Represents the configuration for the `parse` command.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", deny_unknown_fields, default)]
pub struct ParseConfig {
    /// The output format.
    pub format: OutputFormat,
    /// Render full diagnostic detail.
    pub verbose: bool,
}

impl Config {
    /// Loads the configuration.
    ///
    /// If `path` is given, the file must exist; otherwise, `wdlparse.toml` in
    /// the working directory is used if present.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let file = match path {
            Some(path) if !path.exists() => {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Some(path) => config::File::from(path)
                .format(config::FileFormat::Toml)
                .required(true),
            None => config::File::with_name(CONFIG_FILE_NAME)
                .format(config::FileFormat::Toml)
                .required(false),
        };

        let config: Self = config::Config::builder()
            .add_source(file)
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        tracing::debug!(?config, "loaded configuration");
        Ok(config)
    }

    /// Serializes the configuration as TOML.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn defaults() {
        let config = Config::default();
        assert!(config.common.color);
        assert!(!config.common.extract_metadata);
        assert_eq!(config.parse.format, OutputFormat::Human);

        let toml = config.to_toml().unwrap();
        assert!(toml.contains("format = \"human\""));
        assert_eq!(toml::from_str::<Config>(&toml).unwrap(), config);
    }

    #[test]
    fn file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        std::fs::write(&path, "[parse]\nformat = \"json\"\n").unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.parse.format, OutputFormat::Json);
        assert!(config.common.color);
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        std::fs::write(&path, "[parse]\nstyle = \"fancy\"\n").unwrap();
        assert!(matches!(
            Config::load(Some(&path)).unwrap_err(),
            ConfigError::Load(_)
        ));
    }

    #[test]
    fn missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.toml");
        assert!(matches!(
            Config::load(Some(&path)).unwrap_err(),
            ConfigError::NotFound(_)
        ));
    }
}
