//! Shared fixtures: a scripted command runner standing in for pip/build/twine

#![allow(dead_code)]

use async_trait::async_trait;
use pypi_publisher::{CommandError, CommandRunner, Step, ToolCommand, ToolStatus};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Fake runner that classifies each invocation by step, simulates the build
/// tool's side effects and records everything it was asked to run
pub struct ScriptedRunner {
    project_path: PathBuf,
    pub tooling_exit: i32,
    pub build_exit: i32,
    pub check_exit: i32,
    /// Files the simulated build writes into `dist/`
    pub build_outputs: Vec<String>,
    calls: Mutex<Vec<(Step, ToolCommand)>>,
}

impl ScriptedRunner {
    pub fn new(project_path: &Path) -> Self {
        Self {
            project_path: project_path.to_path_buf(),
            tooling_exit: 0,
            build_exit: 0,
            check_exit: 0,
            build_outputs: vec![
                "webscraper-1.0.0.tar.gz".to_string(),
                "webscraper-1.0.0-py3-none-any.whl".to_string(),
            ],
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<(Step, ToolCommand)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn steps(&self) -> Vec<Step> {
        self.calls().into_iter().map(|(step, _)| step).collect()
    }

    fn classify(command: &ToolCommand) -> Step {
        if command.program == "twine" {
            Step::Check
        } else if command.args.iter().any(|arg| arg == "pip") {
            Step::Tooling
        } else {
            Step::Build
        }
    }
}

#[async_trait]
impl CommandRunner for ScriptedRunner {
    async fn run(&self, command: &ToolCommand) -> Result<ToolStatus, CommandError> {
        let step = Self::classify(command);
        self.calls.lock().unwrap().push((step, command.clone()));

        let code = match step {
            Step::Tooling => self.tooling_exit,
            Step::Build => {
                if self.build_exit == 0 {
                    let dist = self.project_path.join("dist");
                    std::fs::create_dir_all(&dist).unwrap();
                    for name in &self.build_outputs {
                        std::fs::write(dist.join(name), b"artifact").unwrap();
                    }
                }
                self.build_exit
            }
            _ => self.check_exit,
        };

        Ok(ToolStatus::from_code(code))
    }
}

pub fn write_pyproject(root: &Path) {
    std::fs::write(
        root.join("pyproject.toml"),
        "[project]\nname = \"webscraper\"\nversion = \"1.0.0\"\n",
    )
    .unwrap();
}

pub fn touch(path: &Path) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(path, b"stale").unwrap();
}
