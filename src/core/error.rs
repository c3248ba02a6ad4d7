//! Error handling for the release pipeline
//!
//! Every failure is "an external tool invocation failed", tagged with the
//! pipeline step that produced it. The exit code of the failing tool is kept
//! so the binary can propagate it unchanged.

use crate::core::traits::Step;
use crate::security::CommandError;
use std::path::PathBuf;
use thiserror::Error;

/// Main error type for release pipeline operations
#[derive(Error, Debug)]
pub enum PublishError {
    // Tool errors
    #[error("[{step}] `{command}` exited with status {exit_code}")]
    ToolFailed {
        step: Step,
        command: String,
        exit_code: i32,
    },

    #[error("[{step}] {source}")]
    Command {
        step: Step,
        #[source]
        source: CommandError,
    },

    // Filesystem errors
    #[error("[clean] failed to remove {}: {}", .path.display(), .source)]
    CleanFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("[build] failed to read distribution directory {}: {}", .path.display(), .source)]
    ArtifactScanFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("[build] build finished but {} contains no distribution files", .dist_dir.display())]
    NoArtifacts { dist_dir: PathBuf },

    // Configuration errors
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Failed to write output: {0}")]
    Output(#[from] std::io::Error),
}

impl PublishError {
    /// Pipeline step this error belongs to, if any
    pub fn step(&self) -> Option<Step> {
        match self {
            Self::ToolFailed { step, .. } | Self::Command { step, .. } => Some(*step),
            Self::CleanFailed { .. } => Some(Step::Clean),
            Self::ArtifactScanFailed { .. } | Self::NoArtifacts { .. } => Some(Step::Build),
            Self::ConfigError(_) | Self::Output(_) => None,
        }
    }

    /// Process exit code to report for this error
    ///
    /// Tool failures propagate the tool's own code.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ToolFailed { exit_code, .. } => *exit_code,
            Self::Command { source, .. } => source.exit_code(),
            Self::CleanFailed { .. }
            | Self::ArtifactScanFailed { .. }
            | Self::NoArtifacts { .. }
            | Self::ConfigError(_)
            | Self::Output(_) => 1,
        }
    }

    /// Get suggested actions for this error
    pub fn suggested_actions(&self) -> Vec<&'static str> {
        match self {
            Self::ToolFailed {
                step: Step::Tooling,
                ..
            } => vec![
                "Check that pip can reach the package index",
                "Activate the intended virtual environment and retry",
            ],
            Self::ToolFailed {
                step: Step::Build, ..
            } => vec![
                "Read the build tool output above",
                "Make sure pyproject.toml (or setup.py) exists in the project directory",
            ],
            Self::ToolFailed { .. } => vec!["Read the tool output above"],
            Self::Command {
                source: CommandError::CommandNotAllowed(_),
                ..
            } => vec!["Add the program to security.allowedCommands in .publish-config.yaml"],
            Self::Command {
                source: CommandError::Timeout(_),
                ..
            } => vec!["Raise or remove timeoutSecs in .publish-config.yaml"],
            Self::Command { .. } => vec![
                "Check that the tool is installed and on PATH",
                "Check the project directory exists",
            ],
            Self::CleanFailed { .. } => vec![
                "Check file permissions on the build output directories",
                "Make sure no other process holds files in build/ or dist/",
            ],
            Self::ArtifactScanFailed { .. } => vec!["Check permissions on the distribution directory"],
            Self::NoArtifacts { .. } => vec![
                "Check distDir in .publish-config.yaml matches the build tool's output directory",
            ],
            Self::ConfigError(_) => vec!["Fix .publish-config.yaml and retry"],
            Self::Output(_) => vec![],
        }
    }

    /// Get error code for this error
    pub fn code(&self) -> &'static str {
        match self {
            Self::ToolFailed { .. } => "TOOL_FAILED",
            Self::Command { .. } => "COMMAND_ERROR",
            Self::CleanFailed { .. } => "CLEAN_FAILED",
            Self::ArtifactScanFailed { .. } => "ARTIFACT_SCAN_FAILED",
            Self::NoArtifacts { .. } => "NO_ARTIFACTS",
            Self::ConfigError(_) => "CONFIG_ERROR",
            Self::Output(_) => "OUTPUT_ERROR",
        }
    }
}
