//! File operations

use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::errors::ConsoleError;

/// A file wrapper with path
#[derive(Debug, Clone)]
pub struct File {
    path: PathBuf,
}

impl File {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Final path component, used as upload file name
    pub fn name(&self) -> Result<String, ConsoleError> {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| ConsoleError::Config(format!("Not a file path: {}", self.path.display())))
    }

    /// Read file contents as bytes
    pub async fn read_bytes(&self) -> Result<Vec<u8>, ConsoleError> {
        fs::read(&self.path).await.map_err(|e| self.not_found_or(e))
    }

    /// Read file as JSON
    pub async fn read_json<T: DeserializeOwned>(&self) -> Result<T, ConsoleError> {
        let contents = self.read_bytes().await?;
        Ok(serde_json::from_slice(&contents)?)
    }

    /// Write bytes, creating parent directories
    pub async fn write_bytes(&self, contents: &[u8]) -> Result<(), ConsoleError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }

        let mut file = fs::File::create(&self.path).await?;
        file.write_all(contents).await?;
        file.sync_all().await?;
        Ok(())
    }

    fn not_found_or(&self, e: std::io::Error) -> ConsoleError {
        if e.kind() == std::io::ErrorKind::NotFound {
            ConsoleError::NotFound(self.path.display().to_string())
        } else {
            ConsoleError::Io(e)
        }
    }
}
