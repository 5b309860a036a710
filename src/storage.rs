use crate::config::StorageConfig;
use crate::error::InferenceError;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Upload and result directories on local disk. Nothing is ever evicted.
#[derive(Clone, Debug)]
pub struct Storage {
    upload_dir: PathBuf,
    output_dir: PathBuf,
}

/// Reduces a client-supplied name to its final path component.
pub fn sanitize_file_name(name: &str) -> Result<String, InferenceError> {
    let trimmed = name.trim();
    // Clients on Windows send backslash separators
    let last = trimmed
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default();

    if last.is_empty() || last == "." || last == ".." {
        return Err(InferenceError::BadRequest(format!(
            "Invalid file name: {:?}",
            name
        )));
    }
    Ok(last.to_string())
}

impl Storage {
    pub fn new(config: &StorageConfig) -> Self {
        Self {
            upload_dir: config.upload_dir.clone(),
            output_dir: config.output_dir.clone(),
        }
    }

    /// Creates both directories if they do not exist yet.
    pub fn ensure_dirs(&self) -> Result<(), InferenceError> {
        std::fs::create_dir_all(&self.upload_dir)?;
        std::fs::create_dir_all(&self.output_dir)?;
        info!(
            uploads = %self.upload_dir.display(),
            outputs = %self.output_dir.display(),
            "Storage directories ready"
        );
        Ok(())
    }

    pub fn upload_dir(&self) -> &Path {
        &self.upload_dir
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Writes an upload, replacing any earlier file with the same name.
    pub async fn save_upload(&self, name: &str, bytes: &[u8]) -> Result<PathBuf, InferenceError> {
        let path = self.upload_dir.join(sanitize_file_name(name)?);
        tokio::fs::write(&path, bytes).await?;
        debug!(path = %path.display(), size = bytes.len(), "Saved upload");
        Ok(path)
    }

    pub fn output_path(&self, name: &str) -> Result<PathBuf, InferenceError> {
        Ok(self.output_dir.join(sanitize_file_name(name)?))
    }

    pub async fn read_output(&self, name: &str) -> Result<Vec<u8>, InferenceError> {
        let path = self.output_path(name)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(InferenceError::NotFound(name.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }
}
