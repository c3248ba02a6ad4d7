//! Upload instructions printed once the artifacts are ready
//!
//! The upload itself stays a manual step: these lines are meant to be
//! copy-pasted as-is.

use crate::core::config::PublishConfig;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadInstructions {
    tool: String,
    staging_repository: String,
    staging_label: String,
    production_label: String,
    dist_dir: String,
    credentials_hint: String,
}

impl UploadInstructions {
    pub fn from_config(config: &PublishConfig) -> Self {
        let upload = &config.upload;
        Self {
            tool: upload.tool.clone(),
            staging_repository: upload.staging_repository.clone(),
            staging_label: upload.staging_label.clone(),
            production_label: upload.production_label.clone(),
            dist_dir: config.dist_dir.trim_end_matches('/').to_string(),
            credentials_hint: upload.credentials_hint.clone(),
        }
    }

    /// e.g. `twine upload --repository testpypi dist/*`
    pub fn staging_command(&self) -> String {
        format!(
            "{} upload --repository {} {}/*",
            self.tool, self.staging_repository, self.dist_dir
        )
    }

    /// e.g. `twine upload dist/*`
    pub fn production_command(&self) -> String {
        format!("{} upload {}/*", self.tool, self.dist_dir)
    }

    pub fn render(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for UploadInstructions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "To upload to {}:", self.staging_label)?;
        writeln!(f, "  {}", self.staging_command())?;
        writeln!(f)?;
        writeln!(f, "To upload to {}:", self.production_label)?;
        writeln!(f, "  {}", self.production_command())?;
        writeln!(f)?;
        writeln!(f, "{}", self.credentials_hint)
    }
}
