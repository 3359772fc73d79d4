use crate::env::SnapEnviron;
use crate::error::Result;
use serde_yaml::{Mapping, Value};
use std::cell::OnceCell;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// A YAML metadata file from the snap. The content is read on first access.
#[derive(Debug, Clone)]
pub struct SnapMetadataFile {
    path: PathBuf,
    data: OnceCell<Mapping>,
}

impl SnapMetadataFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            data: OnceCell::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    pub fn data(&self) -> Result<&Mapping> {
        if let Some(data) = self.data.get() {
            return Ok(data);
        }
        let content = fs::read_to_string(&self.path)?;
        let data = match serde_yaml::from_str::<Option<Mapping>>(&content)? {
            Some(data) => data,
            None => Mapping::new(),
        };
        Ok(self.data.get_or_init(|| data))
    }

    pub fn get(&self, key: &str) -> Result<Option<&Value>> {
        Ok(self.data()?.get(key))
    }

    pub fn len(&self) -> Result<usize> {
        Ok(self.data()?.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.data()?.is_empty())
    }
}

impl fmt::Display for SnapMetadataFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path.display())
    }
}

/// Metadata files shipped in the snap.
#[derive(Debug, Clone)]
pub struct SnapMetadataFiles {
    root: PathBuf,
}

impl SnapMetadataFiles {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn from_environ(env: &SnapEnviron) -> Result<Self> {
        Ok(Self::new(env.require("SNAP")?))
    }

    /// Content of `snap/manifest.yaml`.
    pub fn manifest(&self) -> SnapMetadataFile {
        SnapMetadataFile::new(self.root.join("snap/manifest.yaml"))
    }

    /// Content of `meta/snap.yaml`.
    pub fn snap(&self) -> SnapMetadataFile {
        SnapMetadataFile::new(self.root.join("meta/snap.yaml"))
    }

    /// Content of `snap/snapcraft.yaml`.
    pub fn snapcraft(&self) -> SnapMetadataFile {
        SnapMetadataFile::new(self.root.join("snap/snapcraft.yaml"))
    }
}
