//! Removal of previous build output
//!
//! Cleaning is idempotent: targets that do not exist are skipped, so running
//! it twice in a row removes nothing the second time and still succeeds.

use crate::core::config::CleanConfig;
use crate::core::error::PublishError;
use std::collections::BTreeSet;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};
use walkdir::WalkDir;

/// Deletes build output, distribution output and metadata directories
#[derive(Debug, Clone)]
pub struct ArtifactCleaner {
    project_path: PathBuf,
    config: CleanConfig,
}

impl ArtifactCleaner {
    pub fn new<P: AsRef<Path>>(project_path: P, config: CleanConfig) -> Self {
        Self {
            project_path: project_path.as_ref().to_path_buf(),
            config,
        }
    }

    /// Existing paths that `clean` would remove, sorted and deduplicated
    pub fn targets(&self) -> Vec<PathBuf> {
        let mut targets = BTreeSet::new();

        for path in &self.config.paths {
            let candidate = self.project_path.join(path);
            // symlink_metadata: a dangling or foreign symlink is removed, never followed
            if std::fs::symlink_metadata(&candidate).is_ok() {
                targets.insert(candidate);
            }
        }

        for dir in &self.config.search_dirs {
            let search_root = self.project_path.join(dir);
            let matches = WalkDir::new(&search_root)
                .min_depth(1)
                .max_depth(1)
                .into_iter()
                .filter_map(Result::ok)
                .filter(|entry| entry.file_type().is_dir())
                .filter(|entry| self.has_metadata_suffix(entry.file_name().to_string_lossy().as_ref()));

            for entry in matches {
                targets.insert(normalize(entry.into_path()));
            }
        }

        targets.into_iter().map(normalize).collect()
    }

    fn has_metadata_suffix(&self, name: &str) -> bool {
        self.config
            .metadata_suffixes
            .iter()
            .any(|suffix| name.ends_with(suffix.as_str()) && name.len() > suffix.len())
    }

    /// Remove every target and return what was removed
    pub async fn clean(&self) -> Result<Vec<PathBuf>, PublishError> {
        let mut removed = Vec::new();

        for target in self.targets() {
            let metadata = match fs::symlink_metadata(&target).await {
                Ok(metadata) => metadata,
                Err(e) if e.kind() == ErrorKind::NotFound => continue,
                Err(source) => return Err(PublishError::CleanFailed { path: target, source }),
            };

            let result = if metadata.is_dir() {
                fs::remove_dir_all(&target).await
            } else {
                fs::remove_file(&target).await
            };

            match result {
                Ok(()) => {
                    info!(path = %target.display(), "removed");
                    removed.push(target);
                }
                Err(e) if e.kind() == ErrorKind::NotFound => {
                    debug!(path = %target.display(), "already gone");
                }
                Err(source) => return Err(PublishError::CleanFailed { path: target, source }),
            }
        }

        Ok(removed)
    }
}

/// Drop `.` components so `./foo.egg-info` and `foo.egg-info` compare equal
fn normalize(path: PathBuf) -> PathBuf {
    path.components()
        .filter(|c| !matches!(c, std::path::Component::CurDir))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn touch(path: &Path) {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(path, b"x").unwrap();
    }

    fn cleaner(temp_dir: &TempDir) -> ArtifactCleaner {
        ArtifactCleaner::new(temp_dir.path(), CleanConfig::default())
    }

    #[tokio::test]
    async fn test_removes_all_default_targets() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        touch(&root.join("build/lib/pkg/__init__.py"));
        touch(&root.join("dist/pkg-0.9.0.tar.gz"));
        touch(&root.join("pkg.egg-info/PKG-INFO"));
        touch(&root.join("src/pkg.egg-info/PKG-INFO"));

        let removed = cleaner(&temp_dir).clean().await.unwrap();

        assert_eq!(removed.len(), 4);
        assert!(!root.join("build").exists());
        assert!(!root.join("dist").exists());
        assert!(!root.join("pkg.egg-info").exists());
        assert!(!root.join("src/pkg.egg-info").exists());
        assert!(root.join("src").exists());
    }

    #[tokio::test]
    async fn test_clean_is_idempotent() {
        let temp_dir = TempDir::new().unwrap();
        touch(&temp_dir.path().join("dist/pkg-1.0.0-py3-none-any.whl"));

        let cleaner = cleaner(&temp_dir);
        let first = cleaner.clean().await.unwrap();
        let second = cleaner.clean().await.unwrap();

        assert_eq!(first.len(), 1);
        assert!(second.is_empty());
    }

    #[tokio::test]
    async fn test_clean_on_empty_project() {
        let temp_dir = TempDir::new().unwrap();
        let removed = cleaner(&temp_dir).clean().await.unwrap();
        assert!(removed.is_empty());
    }

    #[tokio::test]
    async fn test_keeps_unrelated_entries() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        touch(&root.join("pyproject.toml"));
        touch(&root.join("src/pkg/__init__.py"));
        touch(&root.join("docs/build.md"));
        // a file with the suffix is not a metadata directory
        touch(&root.join("notes.egg-info"));
        std::fs::create_dir_all(root.join(".egg-info")).unwrap();
        touch(&root.join("src/pkg/nested.egg-info/PKG-INFO"));

        let removed = cleaner(&temp_dir).clean().await.unwrap();

        assert!(removed.is_empty(), "removed {:?}", removed);
        assert!(root.join("notes.egg-info").exists());
        assert!(root.join("src/pkg/nested.egg-info").exists());
    }

    #[test]
    fn test_targets_are_deduplicated() {
        let temp_dir = TempDir::new().unwrap();
        touch(&temp_dir.path().join("pkg.egg-info/PKG-INFO"));

        let config = CleanConfig {
            search_dirs: vec![".".to_string(), "".to_string()],
            ..CleanConfig::default()
        };
        let targets = ArtifactCleaner::new(temp_dir.path(), config).targets();

        assert_eq!(targets.len(), 1);
        assert!(targets[0].ends_with("pkg.egg-info"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_symlinked_dist_is_unlinked_not_followed() {
        let temp_dir = TempDir::new().unwrap();
        let outside = TempDir::new().unwrap();
        touch(&outside.path().join("keep.txt"));
        std::os::unix::fs::symlink(outside.path(), temp_dir.path().join("dist")).unwrap();

        let removed = cleaner(&temp_dir).clean().await.unwrap();

        assert_eq!(removed.len(), 1);
        assert!(outside.path().join("keep.txt").exists());
    }
}
