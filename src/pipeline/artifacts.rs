//! Inventory of the distribution directory

use regex::Regex;
use serde::Serialize;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tokio::fs;

/// `{name}-{version}(-{build})?-{python}-{abi}-{platform}.whl`
static WHEEL_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?P<name>[^-]+)-(?P<version>[^-]+)(?:-\d[^-]*)?-[^-]+-[^-]+-[^-]+\.whl$",
    )
    .expect("wheel file name pattern is valid")
});

/// `{name}-{version}.tar.gz` or `.zip`
static SDIST_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<name>.+)-(?P<version>[^-]+)\.(?:tar\.gz|zip)$")
        .expect("source archive file name pattern is valid")
});

/// Kind of distribution file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    SourceArchive,
    Wheel,
    Other,
}

/// One file in the distribution directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DistributionArtifact {
    pub path: PathBuf,
    pub file_name: String,
    pub kind: ArtifactKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

impl DistributionArtifact {
    /// Classify a file by its name
    pub fn from_path(path: PathBuf) -> Self {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let (kind, captures) = if let Some(caps) = WHEEL_NAME.captures(&file_name) {
            (ArtifactKind::Wheel, Some(caps))
        } else if let Some(caps) = SDIST_NAME.captures(&file_name) {
            (ArtifactKind::SourceArchive, Some(caps))
        } else {
            (ArtifactKind::Other, None)
        };

        let (name, version) = match captures {
            Some(caps) => (
                caps.name("name").map(|m| m.as_str().to_string()),
                caps.name("version").map(|m| m.as_str().to_string()),
            ),
            None => (None, None),
        };

        Self {
            path,
            file_name,
            kind,
            name,
            version,
        }
    }
}

/// Files produced by the build tool
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ArtifactInventory {
    artifacts: Vec<DistributionArtifact>,
}

impl ArtifactInventory {
    /// List regular files in `dist_dir`, sorted by name
    ///
    /// Dot files are skipped, the same way a `dist/*` glob skips them.
    /// A missing directory yields an empty inventory.
    pub async fn scan(dist_dir: &Path) -> std::io::Result<Self> {
        let mut entries = match fs::read_dir(dist_dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(e),
        };

        let mut artifacts = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            if entry.file_name().to_string_lossy().starts_with('.') {
                continue;
            }
            if entry.file_type().await?.is_file() {
                artifacts.push(DistributionArtifact::from_path(entry.path()));
            }
        }

        artifacts.sort_by(|a, b| a.file_name.cmp(&b.file_name));
        Ok(Self { artifacts })
    }

    pub fn artifacts(&self) -> &[DistributionArtifact] {
        &self.artifacts
    }

    pub fn len(&self) -> usize {
        self.artifacts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.artifacts.is_empty()
    }

    pub fn source_archives(&self) -> impl Iterator<Item = &DistributionArtifact> {
        self.of_kind(ArtifactKind::SourceArchive)
    }

    pub fn wheels(&self) -> impl Iterator<Item = &DistributionArtifact> {
        self.of_kind(ArtifactKind::Wheel)
    }

    fn of_kind(&self, kind: ArtifactKind) -> impl Iterator<Item = &DistributionArtifact> {
        self.artifacts.iter().filter(move |a| a.kind == kind)
    }

    /// At least one source archive and one wheel
    pub fn is_complete(&self) -> bool {
        self.source_archives().next().is_some() && self.wheels().next().is_some()
    }

    /// File names joined onto `dist_dir`, ready to append to a command line
    ///
    /// Tools run inside the project, so the configured relative directory is
    /// used instead of the absolute scan path.
    pub fn relative_args(&self, dist_dir: &str) -> Vec<String> {
        self.artifacts
            .iter()
            .map(|a| Path::new(dist_dir).join(&a.file_name).to_string_lossy().into_owned())
            .collect()
    }
}
