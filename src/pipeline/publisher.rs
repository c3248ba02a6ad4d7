//! Package Publisher - sequential release pipeline
//!
//! Runs the fixed step sequence:
//! - Install/upgrade the packaging tools
//! - Remove previous build artifacts
//! - Build the distribution artifacts
//! - Check the artifacts (non-blocking)
//! - Print the manual upload instructions
//!
//! Each step waits for the previous tool to exit. A failing tool stops the
//! run, except the check step whose result is only recorded.

use crate::core::config::PublishConfig;
use crate::core::error::PublishError;
use crate::core::manifest::{detect_package, PackageInfo};
use crate::core::traits::{CommandRunner, Step, ToolCommand};
use crate::pipeline::artifacts::{ArtifactInventory, DistributionArtifact};
use crate::pipeline::clean::ArtifactCleaner;
use crate::pipeline::instructions::UploadInstructions;
use crate::security::command_executor::SafeCommandExecutor;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{info, warn};

/// Record of one executed step
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepRecord {
    pub step: Step,
    /// Tool exit code; `None` for steps that run no tool
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i32>,
    pub duration_ms: u64,
}

/// Report returned after a completed run
#[derive(Debug, Clone, Serialize)]
pub struct PublishReport {
    pub project_path: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub package: Option<PackageInfo>,
    pub removed: Vec<PathBuf>,
    pub artifacts: Vec<DistributionArtifact>,
    pub steps: Vec<StepRecord>,
    pub check_passed: bool,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl PublishReport {
    /// Exit code of the check tool when it failed, otherwise 0
    pub fn exit_code(&self) -> i32 {
        if self.check_passed {
            return 0;
        }
        self.steps
            .iter()
            .find(|record| record.step == Step::Check)
            .and_then(|record| record.exit_code)
            .filter(|code| *code != 0)
            .unwrap_or(1)
    }

    pub fn duration_ms(&self) -> i64 {
        (self.finished_at - self.started_at).num_milliseconds()
    }
}

/// Release pipeline orchestrator
pub struct PackagePublisher<R: CommandRunner> {
    project_path: PathBuf,
    config: PublishConfig,
    runner: R,
}

impl PackagePublisher<SafeCommandExecutor> {
    /// Create a publisher that executes real processes in `project_path`
    ///
    /// The executor's allow-list and timeout come from `config`.
    pub fn new<P: AsRef<Path>>(project_path: P, config: PublishConfig) -> Result<Self, PublishError> {
        let mut executor = SafeCommandExecutor::new(project_path.as_ref())
            .map_err(|source| PublishError::Command {
                step: Step::Tooling,
                source,
            })?
            .with_allowed_commands(config.security.allowed_commands.clone());
        if let Some(timeout) = config.timeout() {
            executor.set_timeout(timeout);
        }

        Ok(Self::with_runner(project_path, config, executor))
    }
}

impl<R: CommandRunner> PackagePublisher<R> {
    /// Create a publisher with a custom command runner
    pub fn with_runner<P: AsRef<Path>>(project_path: P, config: PublishConfig, runner: R) -> Self {
        Self {
            project_path: project_path.as_ref().to_path_buf(),
            config,
            runner,
        }
    }

    pub fn config(&self) -> &PublishConfig {
        &self.config
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    pub fn project_path(&self) -> &Path {
        &self.project_path
    }

    pub fn dist_path(&self) -> PathBuf {
        self.project_path.join(&self.config.dist_dir)
    }

    pub fn instructions(&self) -> UploadInstructions {
        UploadInstructions::from_config(&self.config)
    }

    /// Step 1: install or upgrade the build and upload tools
    pub async fn ensure_tooling(&self) -> Result<StepRecord, PublishError> {
        self.run_step(Step::Tooling, &self.config.tooling).await
    }

    /// Step 2: remove previous build output
    pub async fn clean(&self) -> Result<Vec<PathBuf>, PublishError> {
        ArtifactCleaner::new(&self.project_path, self.config.clean.clone())
            .clean()
            .await
    }

    /// Step 3: build the distribution artifacts
    pub async fn build(&self) -> Result<StepRecord, PublishError> {
        self.run_step(Step::Build, &self.config.build).await
    }

    /// List what the build produced; an empty distribution directory is an error
    pub async fn collect_artifacts(&self) -> Result<ArtifactInventory, PublishError> {
        let dist_dir = self.dist_path();
        let inventory = ArtifactInventory::scan(&dist_dir)
            .await
            .map_err(|source| PublishError::ArtifactScanFailed {
                path: dist_dir.clone(),
                source,
            })?;

        if inventory.is_empty() {
            return Err(PublishError::NoArtifacts { dist_dir });
        }
        if !inventory.is_complete() {
            warn!(
                archives = inventory.source_archives().count(),
                wheels = inventory.wheels().count(),
                "expected at least one source archive and one wheel"
            );
        }

        Ok(inventory)
    }

    /// Step 4: check every artifact
    ///
    /// Never fails: a tool error or non-zero exit is recorded in the returned
    /// record for the caller to report.
    pub async fn verify(&self, inventory: &ArtifactInventory) -> StepRecord {
        let command = self
            .config
            .check
            .with_extra_args(inventory.relative_args(&self.config.dist_dir));
        let started = Instant::now();

        info!(step = %Step::Check, command = %command, "running");
        let exit_code = match self.runner.run(&command).await {
            Ok(status) => status.exit_code(),
            Err(e) => {
                warn!(step = %Step::Check, "{}", e);
                e.exit_code()
            }
        };
        if exit_code != 0 {
            warn!(step = %Step::Check, exit_code, "artifact check failed");
        }

        StepRecord {
            step: Step::Check,
            exit_code: Some(exit_code),
            duration_ms: elapsed_ms(started),
        }
    }

    /// Run the whole pipeline, writing progress and instructions to `out`
    ///
    /// Instructions are written only once artifacts exist.
    pub async fn publish<W: Write>(&self, out: &mut W) -> Result<PublishReport, PublishError> {
        let started_at = Utc::now();
        let mut steps = Vec::new();

        let package = detect_package(&self.project_path).await;
        match &package {
            Some(info) => {
                info!(manifest = %info.manifest, "releasing {}", info.label());
                writeln!(out, "\n📦 {}\n", info.label())?;
            }
            None => {
                warn!(
                    path = %self.project_path.display(),
                    "no pyproject.toml, setup.py or setup.cfg found; the build tool will report the failure"
                );
                writeln!(out, "\n📦 {}\n", self.project_path.display())?;
            }
        }

        // 1. Tooling
        self.announce(out, Step::Tooling)?;
        steps.push(self.ensure_tooling().await?);

        // 2. Clean
        self.announce(out, Step::Clean)?;
        let clean_started = Instant::now();
        let removed = self.clean().await?;
        if removed.is_empty() {
            writeln!(out, "  Nothing to remove")?;
        }
        for path in &removed {
            writeln!(out, "  - {}", self.display_relative(path))?;
        }
        steps.push(StepRecord {
            step: Step::Clean,
            exit_code: None,
            duration_ms: elapsed_ms(clean_started),
        });

        // 3. Build
        self.announce(out, Step::Build)?;
        steps.push(self.build().await?);
        let inventory = self.collect_artifacts().await?;

        // 4. Check
        self.announce(out, Step::Check)?;
        let check = self.verify(&inventory).await;
        let check_passed = check.exit_code == Some(0);
        steps.push(check);

        // 5. Instructions
        writeln!(out)?;
        if check_passed {
            writeln!(out, "✅ Build complete. Distribution files:")?;
        } else {
            writeln!(out, "⚠️  Build complete, but the artifact check reported problems. Distribution files:")?;
        }
        for artifact in inventory.artifacts() {
            writeln!(out, "  - {}", self.display_relative(&artifact.path))?;
        }
        writeln!(out)?;
        write!(out, "{}", self.instructions())?;
        out.flush()?;
        steps.push(StepRecord {
            step: Step::Instructions,
            exit_code: None,
            duration_ms: 0,
        });

        Ok(PublishReport {
            project_path: self.project_path.clone(),
            package,
            removed,
            artifacts: inventory.artifacts().to_vec(),
            steps,
            check_passed,
            started_at,
            finished_at: Utc::now(),
        })
    }

    /// Run one blocking tool step; non-zero exit is fatal
    async fn run_step(&self, step: Step, command: &ToolCommand) -> Result<StepRecord, PublishError> {
        info!(step = %step, command = %command, "running");
        let started = Instant::now();

        let status = self
            .runner
            .run(command)
            .await
            .map_err(|source| PublishError::Command { step, source })?;

        if !status.success() {
            return Err(PublishError::ToolFailed {
                step,
                command: command.to_string(),
                exit_code: status.exit_code(),
            });
        }

        Ok(StepRecord {
            step,
            exit_code: status.code,
            duration_ms: elapsed_ms(started),
        })
    }

    /// Progress header; flushed so it precedes the tool's own output
    fn announce<W: Write>(&self, out: &mut W, step: Step) -> std::io::Result<()> {
        writeln!(out, "▶ {}...", step.description())?;
        out.flush()
    }

    fn display_relative(&self, path: &Path) -> String {
        path.strip_prefix(&self.project_path)
            .unwrap_or(path)
            .display()
            .to_string()
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}
