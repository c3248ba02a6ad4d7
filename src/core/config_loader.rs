//! Configuration file loader for pypi-publisher
//!
//! This module provides configuration loading and validation.

use super::config::*;
use crate::core::error::PublishError;
use regex::Regex;
use std::path::{Component, Path, PathBuf};
use std::sync::LazyLock;
use tokio::fs;
use tracing::debug;

/// Configuration file name
pub const CONFIG_FILENAME: &str = ".publish-config.yaml";

/// Repository names end up in a copy-pasted shell command
static REPOSITORY_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9][A-Za-z0-9._-]*$").expect("repository name pattern is valid")
});

/// Configuration validation result
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigValidationResult {
    /// Is configuration valid?
    pub valid: bool,

    /// Validation errors
    pub errors: Vec<ConfigValidationError>,

    /// Validation warnings
    pub warnings: Vec<ConfigValidationWarning>,
}

/// Configuration validation error
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigValidationError {
    /// Field path (e.g., "clean.paths[0]")
    pub field: String,

    /// Error message
    pub message: String,

    /// Expected type/value
    pub expected: Option<String>,

    /// Actual type/value
    pub actual: Option<String>,
}

/// Configuration validation warning
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigValidationWarning {
    /// Field path
    pub field: String,

    /// Warning message
    pub message: String,

    /// Suggestion
    pub suggestion: Option<String>,
}

/// Configuration file loader
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration for a project
    ///
    /// An explicit path must exist. Otherwise `<project>/.publish-config.yaml`
    /// is used when present, and the defaults when it is not.
    pub async fn load(
        project_path: &Path,
        explicit: Option<&Path>,
    ) -> Result<PublishConfig, PublishError> {
        let config = match explicit {
            Some(path) => Self::load_config_file(path).await?.ok_or_else(|| {
                PublishError::ConfigError(format!(
                    "Config file not found: {}",
                    path.display()
                ))
            })?,
            None => Self::load_config_file(&Self::project_config_path(project_path))
                .await?
                .unwrap_or_default(),
        };

        let result = Self::validate(&config);
        for warning in &result.warnings {
            tracing::warn!(field = %warning.field, "{}", warning.message);
        }
        if !result.valid {
            return Err(PublishError::ConfigError(format!(
                "\n{}",
                Self::format_validation_result(&result)
            )));
        }

        Ok(config)
    }

    /// Location of the project configuration file
    pub fn project_config_path(project_path: &Path) -> PathBuf {
        project_path.join(CONFIG_FILENAME)
    }

    /// Load configuration from YAML file
    async fn load_config_file(file_path: &Path) -> Result<Option<PublishConfig>, PublishError> {
        if !file_path.exists() {
            debug!(path = %file_path.display(), "no config file");
            return Ok(None);
        }

        let content = fs::read_to_string(file_path).await.map_err(|e| {
            PublishError::ConfigError(format!("Failed to read config file: {}", e))
        })?;

        // An empty file means "all defaults"
        if content.trim().is_empty() {
            return Ok(Some(PublishConfig::default()));
        }

        let config: PublishConfig = serde_yaml::from_str(&content).map_err(|e| {
            PublishError::ConfigError(format!("Failed to parse YAML config: {}", e))
        })?;

        debug!(path = %file_path.display(), "loaded config file");
        Ok(Some(config))
    }

    /// Validate configuration
    pub fn validate(config: &PublishConfig) -> ConfigValidationResult {
        let mut errors = Vec::new();
        let mut warnings = Vec::new();

        // 1. Check version (required)
        if config.version.is_empty() {
            errors.push(ConfigValidationError {
                field: "version".to_string(),
                message: "Version is required".to_string(),
                expected: Some("string (e.g., \"1.0\")".to_string()),
                actual: Some("empty".to_string()),
            });
        } else if config.version != "1.0" {
            warnings.push(ConfigValidationWarning {
                field: "version".to_string(),
                message: format!("Unknown version: {}", config.version),
                suggestion: Some("Currently supported version is \"1.0\" only".to_string()),
            });
        }

        // 2. Validate commands
        Self::validate_commands(config, &mut errors);

        // 3. Validate filesystem locations
        Self::validate_locations(config, &mut errors, &mut warnings);

        // 4. Validate upload settings
        Self::validate_upload(&config.upload, &mut errors);

        if config.timeout_secs == Some(0) {
            errors.push(ConfigValidationError {
                field: "timeoutSecs".to_string(),
                message: "timeout must be positive".to_string(),
                expected: Some("integer > 0 or absent".to_string()),
                actual: Some("0".to_string()),
            });
        }

        ConfigValidationResult {
            valid: errors.is_empty(),
            errors,
            warnings,
        }
    }

    /// Every command needs a program, and that program must be allow-listed
    fn validate_commands(config: &PublishConfig, errors: &mut Vec<ConfigValidationError>) {
        for (name, command) in config.commands() {
            if command.program.is_empty() {
                errors.push(ConfigValidationError {
                    field: format!("{}.program", name),
                    message: "program is required".to_string(),
                    expected: Some("non-empty string".to_string()),
                    actual: Some("empty".to_string()),
                });
            } else if !config
                .security
                .allowed_commands
                .iter()
                .any(|allowed| allowed == &command.program)
            {
                errors.push(ConfigValidationError {
                    field: format!("{}.program", name),
                    message: format!(
                        "'{}' is not listed in security.allowedCommands",
                        command.program
                    ),
                    expected: Some(config.security.allowed_commands.join(", ")),
                    actual: Some(command.program.clone()),
                });
            }
        }
    }

    /// Clean targets are deleted recursively: they must stay inside the project
    fn validate_locations(
        config: &PublishConfig,
        errors: &mut Vec<ConfigValidationError>,
        warnings: &mut Vec<ConfigValidationWarning>,
    ) {
        let mut check = |field: String, value: &str| {
            if let Some(message) = Self::unsafe_relative_path(value) {
                errors.push(ConfigValidationError {
                    field,
                    message,
                    expected: Some("relative path inside the project".to_string()),
                    actual: Some(value.to_string()),
                });
            }
        };

        check("distDir".to_string(), &config.dist_dir);
        for (i, path) in config.clean.paths.iter().enumerate() {
            check(format!("clean.paths[{}]", i), path);
        }
        for (i, dir) in config.clean.search_dirs.iter().enumerate() {
            if dir != "." {
                check(format!("clean.searchDirs[{}]", i), dir);
            }
        }

        for (i, suffix) in config.clean.metadata_suffixes.iter().enumerate() {
            if suffix.is_empty() || suffix.contains('/') || suffix.contains('\\') {
                errors.push(ConfigValidationError {
                    field: format!("clean.metadataSuffixes[{}]", i),
                    message: "suffix must be a non-empty file name fragment".to_string(),
                    expected: Some("e.g. \".egg-info\"".to_string()),
                    actual: Some(suffix.clone()),
                });
            }
        }

        let dist = Path::new(&config.dist_dir);
        if !config.clean.paths.iter().any(|p| Path::new(p) == dist) {
            warnings.push(ConfigValidationWarning {
                field: "clean.paths".to_string(),
                message: format!(
                    "{} is not cleaned; stale artifacts may be checked and uploaded",
                    config.dist_dir
                ),
                suggestion: Some(format!("Add \"{}\" to clean.paths", config.dist_dir)),
            });
        }
    }

    fn validate_upload(upload: &UploadConfig, errors: &mut Vec<ConfigValidationError>) {
        if upload.tool.is_empty() {
            errors.push(ConfigValidationError {
                field: "upload.tool".to_string(),
                message: "upload tool is required".to_string(),
                expected: Some("non-empty string".to_string()),
                actual: Some("empty".to_string()),
            });
        }

        if !REPOSITORY_NAME.is_match(&upload.staging_repository) {
            errors.push(ConfigValidationError {
                field: "upload.stagingRepository".to_string(),
                message: "repository name contains unsupported characters".to_string(),
                expected: Some("letters, digits, '.', '_' or '-'".to_string()),
                actual: Some(upload.staging_repository.clone()),
            });
        }
    }

    /// Returns why `value` is unsafe as a project-relative path, if it is
    fn unsafe_relative_path(value: &str) -> Option<String> {
        if value.trim().is_empty() {
            return Some("path is required".to_string());
        }

        let mut normal = 0;
        for component in Path::new(value).components() {
            match component {
                Component::Normal(_) => normal += 1,
                Component::CurDir => {}
                Component::ParentDir => {
                    return Some("path must not contain '..'".to_string());
                }
                Component::RootDir | Component::Prefix(_) => {
                    return Some("path must be relative".to_string());
                }
            }
        }

        if normal == 0 {
            return Some("path must name a directory below the project root".to_string());
        }
        None
    }

    /// Format validation result as human-readable string
    pub fn format_validation_result(result: &ConfigValidationResult) -> String {
        let mut lines = Vec::new();

        if result.valid {
            lines.push("✅ Configuration validation succeeded".to_string());
        } else {
            lines.push("❌ Configuration has errors".to_string());
        }

        if !result.errors.is_empty() {
            lines.push("\n🔴 Errors:".to_string());
            for error in &result.errors {
                lines.push(format!("  - [{}] {}", error.field, error.message));
                if let (Some(expected), Some(actual)) = (&error.expected, &error.actual) {
                    lines.push(format!("    Expected: {}", expected));
                    lines.push(format!("    Actual: {}", actual));
                }
            }
        }

        if !result.warnings.is_empty() {
            lines.push("\n🟡 Warnings:".to_string());
            for warning in &result.warnings {
                lines.push(format!("  - [{}] {}", warning.field, warning.message));
                if let Some(suggestion) = &warning.suggestion {
                    lines.push(format!("    Suggestion: {}", suggestion));
                }
            }
        }

        lines.join("\n")
    }
}
