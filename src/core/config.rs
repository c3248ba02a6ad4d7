//! Configuration structures and types for pypi-publisher
//!
//! Defaults reproduce the canonical release sequence, so a project without a
//! configuration file gets `pip install --upgrade build twine`, `python -m build`
//! and `twine check dist/*`.

use crate::core::traits::ToolCommand;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Root configuration object
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct PublishConfig {
    /// Schema version
    pub version: String,

    /// Installs or upgrades the build and upload tools
    pub tooling: ToolCommand,

    /// Produces the distribution artifacts
    pub build: ToolCommand,

    /// Validates the artifacts; every file in `dist_dir` is appended
    pub check: ToolCommand,

    /// Locations removed before building
    pub clean: CleanConfig,

    /// Directory the build tool writes artifacts into (relative to the project)
    pub dist_dir: String,

    /// Upload instructions printed at the end
    pub upload: UploadConfig,

    /// Command execution settings
    pub security: SecurityConfig,

    /// Per-command timeout in seconds (no timeout when absent)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

/// Build output locations to delete
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct CleanConfig {
    /// Paths removed outright when present
    pub paths: Vec<String>,

    /// Directory name suffixes (e.g. `.egg-info`) removed from `search_dirs`
    pub metadata_suffixes: Vec<String>,

    /// Directories searched (non-recursively) for metadata-suffix directories
    pub search_dirs: Vec<String>,
}

/// Upload instruction settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct UploadConfig {
    /// Upload tool the operator runs by hand
    pub tool: String,

    /// Repository name of the staging index
    pub staging_repository: String,

    /// Display name of the staging index
    pub staging_label: String,

    /// Display name of the production index
    pub production_label: String,

    /// Reminder printed after the commands
    pub credentials_hint: String,
}

/// Security configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct SecurityConfig {
    /// Programs the pipeline may execute
    pub allowed_commands: Vec<String>,
}

impl PublishConfig {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }

    /// The three tool invocations, tagged by field name
    pub fn commands(&self) -> [(&'static str, &ToolCommand); 3] {
        [
            ("tooling", &self.tooling),
            ("build", &self.build),
            ("check", &self.check),
        ]
    }
}

/// Default configuration values
impl Default for PublishConfig {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            tooling: ToolCommand::new(
                "python",
                ["-m", "pip", "install", "--upgrade", "build", "twine"],
            ),
            build: ToolCommand::new("python", ["-m", "build"]),
            check: ToolCommand::new("twine", ["check"]),
            clean: CleanConfig::default(),
            dist_dir: "dist".to_string(),
            upload: UploadConfig::default(),
            security: SecurityConfig::default(),
            timeout_secs: None,
        }
    }
}

impl Default for CleanConfig {
    fn default() -> Self {
        Self {
            paths: vec!["build".to_string(), "dist".to_string()],
            metadata_suffixes: vec![".egg-info".to_string()],
            search_dirs: vec![".".to_string(), "src".to_string()],
        }
    }
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            tool: "twine".to_string(),
            staging_repository: "testpypi".to_string(),
            staging_label: "TestPyPI".to_string(),
            production_label: "PyPI".to_string(),
            credentials_hint:
                "Make sure you have your PyPI credentials configured (~/.pypirc or API token)"
                    .to_string(),
        }
    }
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            allowed_commands: ["python", "python3", "pip", "pip3", "twine"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}
