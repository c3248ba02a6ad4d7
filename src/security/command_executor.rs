//! SafeCommandExecutor: allow-listed external tool execution
//!
//! # Security Features
//!
//! - **Allow-list validation**: Only configured programs can execute
//! - **Injection prevention**: Uses `tokio::process::Command`, never a shell
//! - **Argument safety**: Arguments passed as a Vec, never interpolated into shell strings
//! - **Working directory validation**: Validates existence before execution
//! - **Timeout control**: Kills processes that exceed the configured duration
//!
//! The child inherits stdout and stderr, so the tool's diagnostics reach the
//! operator unchanged.
//!
//! # Example
//!
//! ```rust,no_run
//! use pypi_publisher::SafeCommandExecutor;
//! use std::time::Duration;
//!
//! # async fn demo() -> Result<(), pypi_publisher::CommandError> {
//! let mut executor = SafeCommandExecutor::new(".")?;
//! executor.set_timeout(Duration::from_secs(600));
//!
//! let status = executor.execute("python", &["-m".to_string(), "build".to_string()]).await?;
//! println!("build exited with {:?}", status.code);
//! # Ok(())
//! # }
//! ```

use crate::core::traits::{CommandRunner, ToolCommand, ToolStatus};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tokio::process::Command;
use tracing::{debug, warn};

/// Programs allowed when no allow-list is configured
pub const DEFAULT_ALLOWED_COMMANDS: &[&str] = &["python", "python3", "pip", "pip3", "twine"];

/// Errors that can occur during command execution
#[derive(Error, Debug)]
pub enum CommandError {
    /// Command is not in the allowed list
    #[error("Command '{0}' is not in the allowed command list")]
    CommandNotAllowed(String),

    /// Working directory does not exist or is not accessible
    #[error("Working directory does not exist: {0}")]
    InvalidWorkingDirectory(PathBuf),

    /// Command execution failed (e.g., binary not found, permission denied)
    #[error("Command execution failed: {0}")]
    ExecutionFailed(String),

    /// Command exceeded the timeout duration
    #[error("Command timeout after {0:?}")]
    Timeout(Duration),
}

impl CommandError {
    /// Exit code following shell conventions
    ///
    /// 126 for refused commands, 127 for commands that could not be started,
    /// 124 for timeouts.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::CommandNotAllowed(_) => 126,
            Self::ExecutionFailed(_) => 127,
            Self::Timeout(_) => 124,
            Self::InvalidWorkingDirectory(_) => 1,
        }
    }
}

/// Safe command executor with security controls
#[derive(Debug)]
pub struct SafeCommandExecutor {
    /// Working directory where commands will be executed
    working_dir: PathBuf,
    /// Optional timeout for command execution
    timeout: Option<Duration>,
    /// Programs that may be executed
    allowed_commands: Vec<String>,
}

impl SafeCommandExecutor {
    /// Create a new SafeCommandExecutor with working directory validation.
    ///
    /// # Errors
    ///
    /// Returns `CommandError::InvalidWorkingDirectory` if the directory does not exist.
    pub fn new<P: AsRef<Path>>(working_dir: P) -> Result<Self, CommandError> {
        let working_dir = working_dir.as_ref().to_path_buf();

        if !working_dir.is_dir() {
            return Err(CommandError::InvalidWorkingDirectory(working_dir));
        }

        Ok(Self {
            working_dir,
            timeout: None,
            allowed_commands: DEFAULT_ALLOWED_COMMANDS
                .iter()
                .map(|c| c.to_string())
                .collect(),
        })
    }

    /// Replace the allow-list
    pub fn with_allowed_commands<I, S>(mut self, commands: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_commands = commands.into_iter().map(Into::into).collect();
        self
    }

    /// Set command execution timeout.
    ///
    /// Commands exceeding this duration will be killed.
    pub fn set_timeout(&mut self, timeout: Duration) {
        self.timeout = Some(timeout);
    }

    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }

    pub fn is_allowed(&self, command: &str) -> bool {
        self.allowed_commands.iter().any(|allowed| allowed == command)
    }

    /// Execute a command after allow-list validation and wait for it to exit.
    ///
    /// # Errors
    ///
    /// - `CommandError::CommandNotAllowed` - Command not in the allow-list
    /// - `CommandError::ExecutionFailed` - Binary not found or execution error
    /// - `CommandError::Timeout` - The configured timeout elapsed; the child is killed
    pub async fn execute(&self, command: &str, args: &[String]) -> Result<ToolStatus, CommandError> {
        if !self.is_allowed(command) {
            return Err(CommandError::CommandNotAllowed(command.to_string()));
        }

        debug!(command, ?args, dir = %self.working_dir.display(), "spawning");

        // Arguments are passed as Vec, never interpolated into shell strings
        let mut child = Command::new(command)
            .args(args)
            .current_dir(&self.working_dir)
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| CommandError::ExecutionFailed(format!("{}: {}", command, e)))?;

        let waited = match self.timeout {
            Some(limit) => {
                let result = tokio::time::timeout(limit, child.wait()).await;
                match result {
                    Ok(waited) => waited,
                    Err(_) => {
                        warn!(command, ?limit, "timed out, killing");
                        if let Err(e) = child.kill().await {
                            warn!(command, "failed to kill child: {}", e);
                        }
                        return Err(CommandError::Timeout(limit));
                    }
                }
            }
            None => child.wait().await,
        };

        let status = waited.map_err(|e| CommandError::ExecutionFailed(format!("{}: {}", command, e)))?;
        debug!(command, code = ?status.code(), "exited");

        Ok(ToolStatus::from(status))
    }
}

#[async_trait]
impl CommandRunner for SafeCommandExecutor {
    async fn run(&self, command: &ToolCommand) -> Result<ToolStatus, CommandError> {
        self.execute(&command.program, &command.args).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn get_test_dir() -> PathBuf {
        std::env::temp_dir()
    }

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_default_allow_list() {
        let executor = SafeCommandExecutor::new(get_test_dir()).unwrap();
        assert!(executor.is_allowed("python"));
        assert!(executor.is_allowed("twine"));
        assert!(!executor.is_allowed("rm"));
    }

    #[tokio::test]
    async fn test_rejected_command_rm() {
        let executor = SafeCommandExecutor::new(get_test_dir()).unwrap();
        let result = executor.execute("rm", &args(&["-rf", "/"])).await;
        assert!(
            matches!(result, Err(CommandError::CommandNotAllowed(_))),
            "rm should be rejected as not in allow-list"
        );
    }

    #[tokio::test]
    async fn test_rejected_shell_string() {
        let executor = SafeCommandExecutor::new(get_test_dir()).unwrap();
        let result = executor.execute("python -m build; rm -rf /", &[]).await;
        assert!(matches!(result, Err(CommandError::CommandNotAllowed(_))));
    }

    #[test]
    fn test_invalid_working_directory() {
        let result = SafeCommandExecutor::new("/nonexistent/directory/that/does/not/exist");
        assert!(
            matches!(result, Err(CommandError::InvalidWorkingDirectory(_))),
            "Should reject non-existent working directory"
        );
    }

    #[tokio::test]
    async fn test_missing_binary_is_execution_failure() {
        let executor = SafeCommandExecutor::new(get_test_dir())
            .unwrap()
            .with_allowed_commands(["definitely-not-a-real-binary-4711"]);
        let result = executor.execute("definitely-not-a-real-binary-4711", &[]).await;

        match result {
            Err(error @ CommandError::ExecutionFailed(_)) => assert_eq!(error.exit_code(), 127),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_exit_code_is_reported() {
        let executor = SafeCommandExecutor::new(get_test_dir())
            .unwrap()
            .with_allowed_commands(["sh"]);
        let status = executor.execute("sh", &args(&["-c", "exit 3"])).await.unwrap();

        assert!(!status.success());
        assert_eq!(status.code, Some(3));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_runs_in_working_directory() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let executor = SafeCommandExecutor::new(temp_dir.path())
            .unwrap()
            .with_allowed_commands(["sh"]);
        let status = executor
            .execute("sh", &args(&["-c", "touch marker"]))
            .await
            .unwrap();

        assert!(status.success());
        assert!(temp_dir.path().join("marker").exists());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_arguments_are_not_shell_expanded() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let executor = SafeCommandExecutor::new(temp_dir.path())
            .unwrap()
            .with_allowed_commands(["touch"]);
        let status = executor
            .execute("touch", &args(&["a; touch b"]))
            .await
            .unwrap();

        assert!(status.success());
        assert!(temp_dir.path().join("a; touch b").exists());
        assert!(!temp_dir.path().join("b").exists());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_command_with_timeout() {
        let mut executor = SafeCommandExecutor::new(get_test_dir())
            .unwrap()
            .with_allowed_commands(["sleep"]);
        executor.set_timeout(Duration::from_millis(100));

        let result = executor.execute("sleep", &args(&["5"])).await;
        assert!(
            matches!(result, Err(CommandError::Timeout(_))),
            "Long-running command should time out"
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_runner_trait_delegates() {
        let executor = SafeCommandExecutor::new(get_test_dir())
            .unwrap()
            .with_allowed_commands(["sh"]);
        let command = ToolCommand::new("sh", ["-c", "exit 0"]);

        let status = executor.run(&command).await.unwrap();
        assert!(status.success());
    }
}
