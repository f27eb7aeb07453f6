//! Directory-backed artifact store.

use super::{Artifact, ArtifactName, MigrationError};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Extension of artifact files.
const ARTIFACT_EXTENSION: &str = "json";

/// A directory of `NNNN_<suffix>.json` artifact files.
///
/// Files whose names are not canonical artifact names are ignored.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    dir: PathBuf,
}

impl ArtifactStore {
    /// Open a store, creating the directory if needed.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, MigrationError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|e| MigrationError::io(&dir, e))?;
        Ok(Self { dir })
    }

    /// Refer to an existing directory without creating it.
    ///
    /// Listing a directory that does not exist yields no artifacts.
    pub fn existing(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Directory holding the artifacts.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of an artifact file.
    pub fn path(&self, name: &ArtifactName) -> PathBuf {
        self.dir.join(name.file_name())
    }

    /// All artifact names, sorted.
    pub fn list(&self) -> Result<Vec<ArtifactName>, MigrationError> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(MigrationError::io(&self.dir, e)),
        };

        let mut names = Vec::new();
        for entry in entries {
            let path = entry.map_err(|e| MigrationError::io(&self.dir, e))?.path();
            if !path.is_file()
                || path.extension().and_then(|e| e.to_str()) != Some(ARTIFACT_EXTENSION)
            {
                continue;
            }
            if let Some(name) = path
                .file_stem()
                .and_then(|s| s.to_str())
                .and_then(ArtifactName::parse)
            {
                names.push(name);
            }
        }

        names.sort();
        Ok(names)
    }

    /// Whether an artifact exists.
    pub fn contains(&self, name: &ArtifactName) -> bool {
        self.path(name).is_file()
    }

    /// Read the stored text of an artifact.
    pub fn read_text(&self, name: &ArtifactName) -> Result<String, MigrationError> {
        let path = self.path(name);
        fs::read_to_string(&path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => MigrationError::ArtifactNotFound {
                name: name.to_string(),
            },
            _ => MigrationError::io(path, e),
        })
    }

    /// Read and parse an artifact.
    pub fn read(&self, name: &ArtifactName) -> Result<Artifact, MigrationError> {
        let text = self.read_text(name)?;
        Artifact::parse(name, &text)
    }

    /// Write artifact text, replacing any existing file.
    pub fn write_text(&self, name: &ArtifactName, text: &str) -> Result<(), MigrationError> {
        let path = self.path(name);
        fs::write(&path, text).map_err(|e| MigrationError::io(&path, e))?;
        debug!(artifact = %name, path = %path.display(), "artifact written");
        Ok(())
    }

    /// Render and write an artifact. Returns the written text.
    pub fn write(&self, name: &ArtifactName, artifact: &Artifact) -> Result<String, MigrationError> {
        let text = artifact.render()?;
        self.write_text(name, &text)?;
        Ok(text)
    }
}
