//! Configuration types for autosuite

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default prompt shown while collecting a verdict
pub const DEFAULT_PROMPT: &str = "[autosuite] Is this the expected result (yes/no/cancel)? ";

/// Main configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutosuiteConfig {
    /// Recorder behavior
    pub recorder: RecorderConfig,

    /// Generated module layout
    pub suite: SuiteConfig,
}

impl Default for AutosuiteConfig {
    fn default() -> Self {
        Self {
            recorder: RecorderConfig::default(),
            suite: SuiteConfig::default(),
        }
    }
}

/// Recorder configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecorderConfig {
    /// Prompt text for the verdict question
    pub prompt: String,

    /// Maximum traceback frames echoed for a raised exception
    pub traceback_limit: usize,

    /// Whether wrapped calls are recorded when a session starts
    pub enabled: bool,
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            prompt: DEFAULT_PROMPT.to_string(),
            traceback_limit: 15,
            enabled: true,
        }
    }
}

/// Generated module configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SuiteConfig {
    /// Name of the generated test class
    pub class_name: String,

    /// Name of the single test method
    pub method_name: String,

    /// Spaces before each assertion line
    pub indent: usize,

    /// Default file the suite is written to; stdout when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<PathBuf>,
}

impl Default for SuiteConfig {
    fn default() -> Self {
        Self {
            class_name: "Tester".to_string(),
            method_name: "test_all".to_string(),
            indent: 8,
            output: None,
        }
    }
}

/// Builder for AutosuiteConfig
pub struct ConfigBuilder {
    config: AutosuiteConfig,
}

impl ConfigBuilder {
    /// Create a new configuration builder
    pub fn new() -> Self {
        Self {
            config: AutosuiteConfig::default(),
        }
    }

    /// Set recorder configuration
    pub fn recorder(mut self, config: RecorderConfig) -> Self {
        self.config.recorder = config;
        self
    }

    /// Set suite configuration
    pub fn suite(mut self, config: SuiteConfig) -> Self {
        self.config.suite = config;
        self
    }

    /// Set the default output file
    pub fn output(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.suite.output = Some(path.into());
        self
    }

    /// Build the configuration
    pub fn build(self) -> AutosuiteConfig {
        self.config
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl AutosuiteConfig {
    /// Load configuration from file and environment variables.
    ///
    /// Loads in this order:
    /// 1. Default configuration
    /// 2. Configuration file (autosuite.toml, then AUTOSUITE_CONFIG_PATH if set)
    /// 3. Environment variable overrides (`AUTOSUITE_SUITE__INDENT=4`)
    ///
    /// # Errors
    ///
    /// Returns an error if a configuration file is invalid or the result
    /// fails validation.
    pub fn load() -> crate::error::Result<Self> {
        use figment::{
            Figment,
            providers::{Env, Format, Serialized, Toml},
        };

        let mut figment = Figment::from(Serialized::defaults(AutosuiteConfig::default()))
            .merge(Toml::file("autosuite.toml"));

        if let Ok(path) = std::env::var("AUTOSUITE_CONFIG_PATH") {
            figment = figment.merge(Toml::file(path));
        }

        let config: AutosuiteConfig = figment
            .merge(Env::prefixed("AUTOSUITE_").ignore(&["CONFIG_PATH"]).split("__"))
            .extract()
            .map_err(|e| {
                crate::error::AutosuiteError::Configuration(format!(
                    "Failed to load configuration: {}",
                    e
                ))
            })?;

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: impl AsRef<std::path::Path>) -> crate::error::Result<Self> {
        use figment::{
            Figment,
            providers::{Format, Serialized, Toml},
        };

        let config: AutosuiteConfig = Figment::from(Serialized::defaults(AutosuiteConfig::default()))
            .merge(Toml::file(path.as_ref()))
            .extract()
            .map_err(|e| {
                crate::error::AutosuiteError::Configuration(format!(
                    "Failed to load configuration file: {}",
                    e
                ))
            })?;

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn validate(&self) -> crate::error::Result<()> {
        use crate::error::AutosuiteError;

        if self.suite.indent == 0 {
            return Err(AutosuiteError::Configuration(
                "suite.indent must be at least 1".to_string(),
            ));
        }
        for (field, name) in [
            ("suite.class_name", &self.suite.class_name),
            ("suite.method_name", &self.suite.method_name),
        ] {
            if crate::registry::validate_name(name).is_err() || name.contains('.') {
                return Err(AutosuiteError::Configuration(format!(
                    "{} must be a plain identifier, got {:?}",
                    field, name
                )));
            }
        }
        if self.recorder.prompt.trim().is_empty() {
            return Err(AutosuiteError::Configuration(
                "recorder.prompt must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    #[test]
    fn test_defaults() {
        let config = AutosuiteConfig::default();
        assert_eq!(config.recorder.traceback_limit, 15);
        assert_eq!(config.suite.indent, 8);
        assert_eq!(config.suite.class_name, "Tester");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_file_and_env() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "autosuite.toml",
                r#"
                [suite]
                class_name = "RegressionTests"
                output = "test_generated.py"
                "#,
            )?;
            jail.set_env("AUTOSUITE_RECORDER__TRACEBACK_LIMIT", "3");

            let config = AutosuiteConfig::load().map_err(|e| e.to_string())?;
            assert_eq!(config.suite.class_name, "RegressionTests");
            assert_eq!(config.suite.output, Some(PathBuf::from("test_generated.py")));
            assert_eq!(config.suite.indent, 8);
            assert_eq!(config.recorder.traceback_limit, 3);
            Ok(())
        });
    }

    #[test]
    fn test_invalid_config_rejected() {
        Jail::expect_with(|jail| {
            jail.create_file("bad.toml", "[suite]\nindent = 0\n")?;
            let err = AutosuiteConfig::from_file("bad.toml").unwrap_err();
            assert!(err.to_string().contains("indent"));

            jail.create_file("dotted.toml", "[suite]\nclass_name = \"a.b\"\n")?;
            assert!(AutosuiteConfig::from_file("dotted.toml").is_err());
            Ok(())
        });
    }

    #[test]
    fn test_builder() {
        let config = ConfigBuilder::new().output("out.py").build();
        assert_eq!(config.suite.output, Some(PathBuf::from("out.py")));
    }
}
