//! Core traits and types for the release pipeline
//!
//! This module defines the pipeline steps, the description of an external
//! tool invocation, and the `CommandRunner` seam the pipeline executes through.

use crate::security::CommandError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Steps
// ============================================================================

/// One stage of the release pipeline, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Step {
    Tooling,
    Clean,
    Build,
    Check,
    Instructions,
}

impl Step {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Tooling => "tooling",
            Self::Clean => "clean",
            Self::Build => "build",
            Self::Check => "check",
            Self::Instructions => "instructions",
        }
    }

    /// Human readable description used in progress output
    pub fn description(&self) -> &'static str {
        match self {
            Self::Tooling => "Installing/upgrading packaging tools",
            Self::Clean => "Removing previous build artifacts",
            Self::Build => "Building distribution artifacts",
            Self::Check => "Checking distribution artifacts",
            Self::Instructions => "Upload instructions",
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Tool invocation
// ============================================================================

/// An external program and its arguments, passed without shell interpretation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCommand {
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
}

impl ToolCommand {
    pub fn new<P, I, S>(program: P, args: I) -> Self
    where
        P: Into<String>,
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// Copy of this command with `extra` appended to the argument list
    pub fn with_extra_args<I, S>(&self, extra: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut command = self.clone();
        command.args.extend(extra.into_iter().map(Into::into));
        command
    }
}

impl fmt::Display for ToolCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// Exit status of a finished tool
///
/// `code` is `None` when the process was terminated by a signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolStatus {
    pub code: Option<i32>,
}

impl ToolStatus {
    pub fn from_code(code: i32) -> Self {
        Self { code: Some(code) }
    }

    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    /// Exit code to propagate; signal termination maps to 1
    pub fn exit_code(&self) -> i32 {
        self.code.unwrap_or(1)
    }
}

impl From<std::process::ExitStatus> for ToolStatus {
    fn from(status: std::process::ExitStatus) -> Self {
        Self {
            code: status.code(),
        }
    }
}

// ============================================================================
// Command Runner Trait
// ============================================================================

/// Executes external tools on behalf of the pipeline
///
/// Implementations block (asynchronously) until the tool exits. The tool's own
/// output is not captured: it belongs to the operator's terminal.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run `command` to completion and report its exit status
    async fn run(&self, command: &ToolCommand) -> Result<ToolStatus, CommandError>;
}
