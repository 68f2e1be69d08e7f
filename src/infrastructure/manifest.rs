//! Backpack manifest: the on-disk description of one packaging run.
//!
//! ```toml
//! stub = "runtime/node"
//! output = "dist/app"
//! prelude = "prelude/bootstrap.js"
//! options = ["--max-old-space-size=4096"]
//!
//! [target]
//! platform = "linux"
//! arch = "x64"
//!
//! [[entries]]
//! snapshot = "/snapshot/app/index.js"
//! store = "code"
//! buffer = "require('./lib')"
//!
//! [[entries]]
//! snapshot = "/snapshot/app/logo.png"
//! store = "content"
//! file = "assets/logo.png"
//! ```
//!
//! Relative paths resolve against the manifest's directory.

use base64::Engine;
use bytes::Bytes;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

use crate::application::use_cases::AssemblyRequest;
use crate::domain::entities::{Backpack, Entry, Stripe, Target};
use crate::domain::errors::DomainError;
use crate::domain::value_objects::{SnapshotId, StorageKind};

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Unsupported manifest format: {0}")]
    UnsupportedFormat(String),

    #[error("Failed to parse manifest: {0}")]
    Parse(String),

    #[error("Malformed entry: {0}")]
    MalformedEntry(#[from] DomainError),

    #[error("Invalid base64 buffer for {snapshot}: {source}")]
    Base64 {
        snapshot: String,
        #[source]
        source: base64::DecodeError,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManifestFormat {
    Toml,
    Json,
    Yaml,
}

impl ManifestFormat {
    pub fn from_path(path: &Path) -> Result<Self, ManifestError> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
            .unwrap_or_default();
        match extension.as_str() {
            "toml" => Ok(ManifestFormat::Toml),
            "json" => Ok(ManifestFormat::Json),
            "yaml" | "yml" => Ok(ManifestFormat::Yaml),
            other => Err(ManifestError::UnsupportedFormat(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TargetManifest {
    pub platform: Option<String>,
    pub arch: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EntryManifest {
    pub snapshot: String,
    pub store: StorageKind,
    pub file: Option<PathBuf>,
    /// UTF-8 text content
    pub buffer: Option<String>,
    /// Binary content, standard base64
    pub buffer_base64: Option<String>,
}

impl EntryManifest {
    fn into_entry(self) -> Result<Entry, ManifestError> {
        let snapshot = SnapshotId::new(self.snapshot)?;

        let buffer = match (self.buffer, self.buffer_base64) {
            (Some(_), Some(_)) => {
                return Err(DomainError::AmbiguousSource {
                    snapshot: snapshot.to_string(),
                }
                .into())
            }
            (Some(text), None) => Some(Bytes::from(text)),
            (None, Some(encoded)) => Some(Bytes::from(
                base64::engine::general_purpose::STANDARD
                    .decode(encoded.trim())
                    .map_err(|source| ManifestError::Base64 {
                        snapshot: snapshot.to_string(),
                        source,
                    })?,
            )),
            (None, None) => None,
        };

        Ok(Entry::from_parts(snapshot, self.store, self.file, buffer)?)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Manifest {
    pub stub: PathBuf,
    pub output: PathBuf,
    /// Path of the prelude template
    pub prelude: PathBuf,
    #[serde(default)]
    pub options: Vec<String>,
    #[serde(default)]
    pub target: TargetManifest,
    /// External compile command line
    #[serde(default)]
    pub compiler: Option<String>,
    #[serde(default)]
    pub entries: Vec<EntryManifest>,
}

impl Manifest {
    pub fn parse(content: &str, format: ManifestFormat) -> Result<Self, ManifestError> {
        match format {
            ManifestFormat::Toml => {
                toml::from_str(content).map_err(|e| ManifestError::Parse(e.to_string()))
            }
            ManifestFormat::Json => {
                serde_json::from_str(content).map_err(|e| ManifestError::Parse(e.to_string()))
            }
            ManifestFormat::Yaml => {
                serde_yaml::from_str(content).map_err(|e| ManifestError::Parse(e.to_string()))
            }
        }
    }

    /// Read and parse a manifest, resolving its relative paths
    pub async fn load(path: &Path) -> Result<Self, ManifestError> {
        let format = ManifestFormat::from_path(path)?;
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| ManifestError::Io {
                path: path.to_path_buf(),
                source,
            })?;

        let mut manifest = Self::parse(&content, format)?;
        if let Some(base) = path.parent() {
            manifest.resolve_paths(base);
        }
        debug!(path = ?path, entries = manifest.entries.len(), "Manifest loaded");
        Ok(manifest)
    }

    /// Make every relative path absolute with respect to `base`
    pub fn resolve_paths(&mut self, base: &Path) {
        let resolve = |p: &mut PathBuf| {
            if p.is_relative() {
                *p = base.join(&*p);
            }
        };
        resolve(&mut self.stub);
        resolve(&mut self.output);
        resolve(&mut self.prelude);
        for entry in &mut self.entries {
            if let Some(file) = entry.file.as_mut() {
                resolve(file);
            }
        }
    }

    pub fn target(&self) -> Target {
        let mut target = Target::new(&self.stub, &self.output);
        if let Some(platform) = &self.target.platform {
            target = target.with_platform(platform);
        }
        if let Some(arch) = &self.target.arch {
            target = target.with_arch(arch);
        }
        target
    }

    /// Build the stripe; fails on the first entry without exactly one source
    pub fn stripe(&self) -> Result<Stripe, ManifestError> {
        self.entries
            .iter()
            .cloned()
            .map(EntryManifest::into_entry)
            .collect()
    }

    /// Read the prelude template and build the assembly request
    pub async fn into_request(self) -> Result<AssemblyRequest, ManifestError> {
        let prelude = tokio::fs::read_to_string(&self.prelude)
            .await
            .map_err(|source| ManifestError::Io {
                path: self.prelude.clone(),
                source,
            })?;

        Ok(AssemblyRequest {
            backpack: Backpack::new(prelude, self.stripe()?),
            target: self.target(),
            options: self.options,
        })
    }
}
