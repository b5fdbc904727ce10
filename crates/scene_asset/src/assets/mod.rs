//! Scene asset loading and saving

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::scene::{ParseError, ParseOptions, SceneNodeTree};

/// Asset trait for loadable resources
pub trait Asset: Send + Sync + 'static {
    /// Load asset from raw bytes
    fn from_bytes(bytes: &[u8], options: &ParseOptions) -> Result<Self, AssetError>
    where
        Self: Sized;
}

impl Asset for SceneNodeTree {
    fn from_bytes(bytes: &[u8], options: &ParseOptions) -> Result<Self, AssetError> {
        let text = std::str::from_utf8(bytes).map_err(|e| AssetError::InvalidData(e.to_string()))?;
        Ok(Self::parse_with(text, options)?)
    }
}

/// Loads scene files from a list of search paths
#[derive(Debug, Clone, Default)]
pub struct SceneLoader {
    options: ParseOptions,
    search_paths: Vec<PathBuf>,
}

impl SceneLoader {
    /// Create a loader with the given parse options and no search paths
    pub fn new(options: ParseOptions) -> Self {
        Self {
            options,
            search_paths: Vec::new(),
        }
    }

    /// Builder pattern: Add a directory to search, after existing ones
    #[must_use]
    pub fn with_search_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.search_paths.push(path.into());
        self
    }

    /// Options used for every load
    pub fn options(&self) -> &ParseOptions {
        &self.options
    }

    /// Find `path` in the search paths, falling back to `path` itself
    pub fn resolve(&self, path: impl AsRef<Path>) -> Option<PathBuf> {
        let path = path.as_ref();
        self.search_paths
            .iter()
            .map(|dir| dir.join(path))
            .find(|candidate| candidate.exists())
            .or_else(|| path.exists().then(|| path.to_path_buf()))
    }

    /// Load an asset from disk
    ///
    /// # Arguments
    /// * `path` - Path to the asset file (relative to search paths)
    pub fn load<T: Asset>(&self, path: impl AsRef<Path>) -> Result<T, AssetError> {
        let path = path.as_ref();
        let file_path = self
            .resolve(path)
            .ok_or_else(|| AssetError::NotFound(path.display().to_string()))?;

        let bytes = fs::read(&file_path)?;
        let asset = T::from_bytes(&bytes, &self.options)?;

        log::debug!("Loaded {} ({} bytes)", file_path.display(), bytes.len());
        Ok(asset)
    }

    /// Write a tree to `path` in text form
    pub fn save(&self, tree: &SceneNodeTree, path: impl AsRef<Path>) -> Result<(), AssetError> {
        let path = path.as_ref();
        fs::write(path, tree.serialize())?;
        log::debug!("Saved {} node(s) to {}", tree.len(), path.display());
        Ok(())
    }
}

/// Asset loading errors
#[derive(Error, Debug)]
pub enum AssetError {
    /// Asset not found
    #[error("Asset not found: {0}")]
    NotFound(String),

    /// Invalid asset data
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// Scene text failed to parse or validate
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    /// IO error during asset loading
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}
