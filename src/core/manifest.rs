//! Package description file detection
//!
//! The build tool owns the package metadata; this only looks far enough to
//! name the package in logs and in the run summary.

use serde::Serialize;
use std::path::Path;
use tokio::fs;
use tracing::{debug, warn};

/// Files the build tool accepts as a package description, in lookup order
pub const MANIFEST_FILES: &[&str] = &["pyproject.toml", "setup.py", "setup.cfg"];

/// Package found in the project directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PackageInfo {
    /// Manifest file the package was detected from
    pub manifest: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

impl PackageInfo {
    /// `name version` when both are known, otherwise whatever is
    pub fn label(&self) -> String {
        match (&self.name, &self.version) {
            (Some(name), Some(version)) => format!("{} {}", name, version),
            (Some(name), None) => name.clone(),
            _ => format!("package from {}", self.manifest),
        }
    }
}

/// Detect the package description file in `project_path`
///
/// Returns `None` when none of [`MANIFEST_FILES`] exists.
pub async fn detect_package(project_path: &Path) -> Option<PackageInfo> {
    for manifest in MANIFEST_FILES {
        let path = project_path.join(manifest);
        if fs::metadata(&path).await.is_err() {
            continue;
        }

        let mut info = PackageInfo {
            manifest: manifest.to_string(),
            name: None,
            version: None,
        };

        if *manifest == "pyproject.toml" {
            match fs::read_to_string(&path).await {
                Ok(content) => read_pyproject(&content, &mut info),
                Err(e) => warn!(path = %path.display(), "cannot read manifest: {}", e),
            }
        }

        debug!(manifest = %info.manifest, name = ?info.name, version = ?info.version, "detected package");
        return Some(info);
    }

    None
}

/// Fill name/version from `[project]`, falling back to `[tool.poetry]`
fn read_pyproject(content: &str, info: &mut PackageInfo) {
    let table: toml::Table = match toml::from_str(content) {
        Ok(table) => table,
        Err(e) => {
            warn!("pyproject.toml is not valid TOML: {}", e);
            return;
        }
    };

    let sections = [
        table.get("project"),
        table
            .get("tool")
            .and_then(|tool| tool.get("poetry")),
    ];

    for section in sections.into_iter().flatten() {
        if info.name.is_none() {
            info.name = section.get("name").and_then(|v| v.as_str()).map(String::from);
        }
        if info.version.is_none() {
            info.version = section
                .get("version")
                .and_then(|v| v.as_str())
                .map(String::from);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_detect_pyproject() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(
            temp_dir.path().join("pyproject.toml"),
            "[project]\nname = \"webscraper\"\nversion = \"0.3.1\"\n",
        )
        .unwrap();

        let info = detect_package(temp_dir.path()).await.unwrap();
        assert_eq!(info.manifest, "pyproject.toml");
        assert_eq!(info.name.as_deref(), Some("webscraper"));
        assert_eq!(info.version.as_deref(), Some("0.3.1"));
        assert_eq!(info.label(), "webscraper 0.3.1");
    }

    #[tokio::test]
    async fn test_detect_dynamic_version() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(
            temp_dir.path().join("pyproject.toml"),
            "[project]\nname = \"webscraper\"\ndynamic = [\"version\"]\n",
        )
        .unwrap();

        let info = detect_package(temp_dir.path()).await.unwrap();
        assert_eq!(info.version, None);
        assert_eq!(info.label(), "webscraper");
    }

    #[tokio::test]
    async fn test_detect_poetry_section() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(
            temp_dir.path().join("pyproject.toml"),
            "[tool.poetry]\nname = \"legacy\"\nversion = \"1.0.0\"\n",
        )
        .unwrap();

        let info = detect_package(temp_dir.path()).await.unwrap();
        assert_eq!(info.name.as_deref(), Some("legacy"));
    }

    #[tokio::test]
    async fn test_detect_setup_py() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::File::create(temp_dir.path().join("setup.py")).unwrap();

        let info = detect_package(temp_dir.path()).await.unwrap();
        assert_eq!(info.manifest, "setup.py");
        assert_eq!(info.name, None);
        assert_eq!(info.label(), "package from setup.py");
    }

    #[tokio::test]
    async fn test_invalid_pyproject_still_detected() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(temp_dir.path().join("pyproject.toml"), "[project\n").unwrap();

        let info = detect_package(temp_dir.path()).await.unwrap();
        assert_eq!(info.manifest, "pyproject.toml");
        assert_eq!(info.name, None);
    }

    #[tokio::test]
    async fn test_no_manifest() {
        let temp_dir = TempDir::new().unwrap();
        assert!(detect_package(temp_dir.path()).await.is_none());
    }
}
