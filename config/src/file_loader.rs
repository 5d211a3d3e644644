//! # Configuration File Loading
//!
//! Loads configuration from TOML or YAML files.
//!
//! Supports automatic format detection based on file extension.

use crate::config::Config;
use std::path::Path;

/// Configuration file loading error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigFileError {
    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Failed to parse TOML: {0}")]
    TomlParse(String),

    #[error("Failed to parse YAML: {0}")]
    YamlParse(String),

    #[error("Config file has no extension")]
    NoExtension,

    #[error("Unsupported config file format: {0}")]
    UnsupportedFormat(String)
}

/// Load configuration from a TOML file.
///
/// ## Usage
/// ```rust,no_run
/// use config::load_from_toml;
/// use std::path::Path;
///
/// fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let config = load_from_toml(Path::new("quickbrief.toml"))?;
///     println!("Model: {}", config.llm.model);
///     Ok(())
/// }
/// ```
///
/// ## Error Handling
/// Returns `ConfigFileError` for:
/// - File not found
/// - Invalid TOML syntax
pub fn load_from_toml(path: &Path) -> Result<Config, ConfigFileError> {
    let contents = std::fs::read_to_string(path)
        .map_err(|_e| ConfigFileError::FileNotFound(path.display().to_string()))?;

    toml::from_str(&contents).map_err(|e| ConfigFileError::TomlParse(e.to_string()))
}

/// Load configuration from a YAML file.
///
/// ## Error Handling
/// Returns `ConfigFileError` for:
/// - File not found
/// - Invalid YAML syntax
pub fn load_from_yaml(path: &Path) -> Result<Config, ConfigFileError> {
    let contents = std::fs::read_to_string(path)
        .map_err(|_e| ConfigFileError::FileNotFound(path.display().to_string()))?;

    serde_yaml::from_str(&contents).map_err(|e| ConfigFileError::YamlParse(e.to_string()))
}

/// Load configuration from file with auto-detection.
///
/// ## Supported Formats
/// - `.toml`: TOML format
/// - `.yaml`: YAML format
/// - `.yml`: YAML format
pub fn load_from_file(path: &Path) -> Result<Config, ConfigFileError> {
    let extension = path
        .extension()
        .and_then(|s| s.to_str())
        .ok_or(ConfigFileError::NoExtension)?;

    match extension.to_lowercase().as_str() {
        "toml" => load_from_toml(path),
        "yaml" | "yml" => load_from_yaml(path),
        other => Err(ConfigFileError::UnsupportedFormat(other.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_load_from_toml() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("quickbrief.toml");

        let toml_content = r#"
[server]
port = 8080

[llm]
api_key = "gsk_file"
model = "llama-3.1-8b-instant"

[retry]
max_attempts = 4
delay_ms = 500

[mail]
default_from = "briefs@example.com"

[observability]
logging_level = "debug"
"#;
        fs::write(&path, toml_content).unwrap();

        let config = load_from_toml(&path).unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.llm.api_key.as_deref(), Some("gsk_file"));
        assert_eq!(config.llm.model, "llama-3.1-8b-instant");
        assert_eq!(config.retry.max_attempts, 4);
        assert_eq!(config.retry.delay_ms, 500);
        assert_eq!(config.mail.default_from.as_deref(), Some("briefs@example.com"));
        assert_eq!(config.observability.logging_level, "debug");
        assert_eq!(config.pipeline.request_deadline_secs, 120);
    }

    #[test]
    fn test_load_from_yaml() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("quickbrief.yaml");

        let yaml_content = r#"
llm:
  model: mixtral-8x7b-32768
  timeout_secs: 30
pipeline:
  request_deadline_secs: 45
  history_window: 4
"#;
        fs::write(&path, yaml_content).unwrap();

        let config = load_from_yaml(&path).unwrap();
        assert_eq!(config.llm.model, "mixtral-8x7b-32768");
        assert_eq!(config.llm.timeout_secs, 30);
        assert_eq!(config.pipeline.request_deadline_secs, 45);
        assert_eq!(config.pipeline.history_window, 4);
        assert_eq!(config.retry.delay_ms, 1500);
    }

    #[test]
    fn test_load_from_file_auto_detect_yml() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("quickbrief.yml");
        fs::write(&path, "server:\n  port: 9000\n").unwrap();

        let config = load_from_file(&path).unwrap();
        assert_eq!(config.server.port, 9000);
    }

    #[test]
    fn test_load_from_file_unsupported() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("quickbrief.json");
        fs::write(&path, "{}").unwrap();

        let result = load_from_file(&path);
        assert!(matches!(result, Err(ConfigFileError::UnsupportedFormat(_))));
    }

    #[test]
    fn test_load_from_file_no_extension() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("quickbrief");
        fs::write(&path, "").unwrap();

        let result = load_from_file(&path);
        assert!(matches!(result, Err(ConfigFileError::NoExtension)));
    }

    #[test]
    fn test_load_from_toml_missing_file() {
        let result = load_from_toml(Path::new("/nonexistent/quickbrief.toml"));
        assert!(matches!(result, Err(ConfigFileError::FileNotFound(_))));
    }

    #[test]
    fn test_load_from_toml_invalid_syntax() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.toml");
        fs::write(&path, "[retry\nmax_attempts = ").unwrap();

        let result = load_from_toml(&path);
        assert!(matches!(result, Err(ConfigFileError::TomlParse(_))));
    }
}
