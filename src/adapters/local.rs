use crate::core::format::guess_mime;
use crate::domain::model::ImportFile;
use crate::domain::ports::FileSource;
use crate::utils::error::Result;
use std::path::{Path, PathBuf};

/// Reads catalog files from disk, relative to `base_path`.
#[derive(Debug, Clone)]
pub struct LocalFileSource {
    base_path: PathBuf,
}

impl LocalFileSource {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }
}

impl Default for LocalFileSource {
    fn default() -> Self {
        Self::new(".")
    }
}

impl FileSource for LocalFileSource {
    async fn read_file(&self, path: &str) -> Result<ImportFile> {
        let full_path = self.base_path.join(path);
        tracing::debug!("Reading {}", full_path.display());

        let content = tokio::fs::read(&full_path).await?;
        let name = Path::new(path)
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or(path)
            .to_string();
        let mime_type = guess_mime(&name);

        Ok(ImportFile::new(name, mime_type, content))
    }
}
