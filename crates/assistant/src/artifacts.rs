//! Artifacts handed to the user interface.
//!
//! Tools publish named payloads (the current page snapshot, the payment QR
//! image) through an [`ArtifactStore`]. Each save of a name creates a new
//! version; the UI shows the latest one.

use std::collections::HashMap;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use thiserror::Error;
use tracing::{debug, instrument};

/// Artifact name of the current page snapshot.
pub const HTML_ARTIFACT: &str = "html";

/// Artifact name of the payment QR image.
pub const PAYMENT_QR_ARTIFACT: &str = "payment_qr";

/// Errors raised while saving an artifact.
#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("failed to write artifact {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("artifact store lock poisoned")]
    Poisoned,
}

/// A named payload with its MIME type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub mime_type: String,
    pub data: Vec<u8>,
}

impl Artifact {
    #[must_use]
    pub fn new(mime_type: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        Self {
            mime_type: mime_type.into(),
            data: data.into(),
        }
    }

    /// An HTML document.
    #[must_use]
    pub fn html(html: &str) -> Self {
        Self::new("text/html", html.as_bytes())
    }

    /// A JPEG image.
    #[must_use]
    pub fn jpeg(data: Vec<u8>) -> Self {
        Self::new("image/jpeg", data)
    }

    /// File extension for this artifact's MIME type.
    #[must_use]
    pub fn extension(&self) -> &'static str {
        match self.mime_type.as_str() {
            "text/html" => "html",
            "image/jpeg" => "jpg",
            "image/png" => "png",
            "application/json" => "json",
            "text/plain" => "txt",
            _ => "bin",
        }
    }
}

/// Destination for artifacts published by tools.
pub trait ArtifactStore: Send + Sync {
    /// Save a new version of `name`, returning its version number (starting
    /// at 1).
    fn save(
        &self,
        name: &str,
        artifact: Artifact,
    ) -> impl Future<Output = Result<u32, ArtifactError>> + Send;
}

/// Keeps the latest version of each artifact in memory, with a count of how
/// many versions were saved.
#[derive(Debug, Default)]
pub struct InMemoryArtifacts {
    entries: Mutex<HashMap<String, Versioned>>,
}

#[derive(Debug)]
struct Versioned {
    version: u32,
    artifact: Artifact,
}

impl InMemoryArtifacts {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The newest version of `name`.
    #[must_use]
    pub fn latest(&self, name: &str) -> Option<Artifact> {
        self.entries
            .lock()
            .ok()?
            .get(name)
            .map(|entry| entry.artifact.clone())
    }

    /// Number of saved versions of `name`.
    #[must_use]
    pub fn version_count(&self, name: &str) -> usize {
        self.entries
            .lock()
            .map(|entries| {
                entries.get(name).map_or(0, |entry| {
                    usize::try_from(entry.version).unwrap_or(usize::MAX)
                })
            })
            .unwrap_or(0)
    }
}

impl ArtifactStore for InMemoryArtifacts {
    async fn save(&self, name: &str, artifact: Artifact) -> Result<u32, ArtifactError> {
        let mut entries = self.entries.lock().map_err(|_| ArtifactError::Poisoned)?;
        let version = match entries.get_mut(name) {
            Some(entry) => {
                entry.version = entry.version.saturating_add(1);
                entry.artifact = artifact;
                entry.version
            }
            None => {
                entries.insert(name.to_string(), Versioned { version: 1, artifact });
                1
            }
        };
        drop(entries);
        debug!(name, version, "Artifact saved");
        Ok(version)
    }
}

/// Writes the latest version of each artifact to `{dir}/{name}.{ext}`.
#[derive(Debug)]
pub struct DirectoryArtifacts {
    dir: PathBuf,
    versions: Mutex<HashMap<String, u32>>,
}

impl DirectoryArtifacts {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            versions: Mutex::new(HashMap::new()),
        }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn next_version(&self, name: &str) -> Result<u32, ArtifactError> {
        let mut versions = self.versions.lock().map_err(|_| ArtifactError::Poisoned)?;
        let version = versions.entry(name.to_string()).or_insert(0);
        *version += 1;
        Ok(*version)
    }
}

impl ArtifactStore for DirectoryArtifacts {
    #[instrument(skip(self, artifact), fields(dir = %self.dir.display()))]
    async fn save(&self, name: &str, artifact: Artifact) -> Result<u32, ArtifactError> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|source| ArtifactError::Io {
                path: self.dir.clone(),
                source,
            })?;

        let path = self.dir.join(format!("{name}.{}", artifact.extension()));
        tokio::fs::write(&path, &artifact.data)
            .await
            .map_err(|source| ArtifactError::Io {
                path: path.clone(),
                source,
            })?;

        let version = self.next_version(name)?;
        debug!(path = %path.display(), version, "Artifact written");
        Ok(version)
    }
}
