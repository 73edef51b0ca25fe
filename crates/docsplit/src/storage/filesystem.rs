use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::StorageError;

/// Writes split documents under `{output_root}/{job_id}/`.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    output_root: PathBuf,
}

impl ArtifactStore {
    pub fn new<P: AsRef<Path>>(output_root: P) -> Self {
        Self {
            output_root: output_root.as_ref().to_path_buf(),
        }
    }

    pub fn job_directory(&self, job_id: &str) -> PathBuf {
        self.output_root.join(job_id)
    }

    /// `{output_root}/{job_id}/{base}_doc_{sequence}.pdf`
    pub fn artifact_path(&self, job_id: &str, base: &str, sequence: usize) -> PathBuf {
        self.job_directory(job_id)
            .join(format!("{}_doc_{}.pdf", base, sequence))
    }

    /// Writes one segment. Fails with [`StorageError::FileExists`] instead of
    /// replacing an existing artifact.
    pub fn store_segment(
        &self,
        job_id: &str,
        base: &str,
        sequence: usize,
        content: &[u8],
    ) -> Result<PathBuf, StorageError> {
        ensure_directory(&self.job_directory(job_id))?;
        let path = self.artifact_path(job_id, base, sequence);
        write_new(&path, content)?;
        Ok(path)
    }
}

pub fn ensure_directory(path: &Path) -> Result<(), StorageError> {
    if !path.exists() {
        std::fs::create_dir_all(path).map_err(|e| StorageError::CreateDirectory {
            path: path.to_path_buf(),
            source: e,
        })?;
    }
    Ok(())
}

/// Creates `path` with O_EXCL and writes `content` to it.
pub fn write_new(path: &Path, content: &[u8]) -> Result<(), StorageError> {
    let mut file = match std::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
    {
        Ok(file) => file,
        Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
            return Err(StorageError::FileExists(path.to_path_buf()));
        }
        Err(e) => {
            return Err(StorageError::WriteFile {
                path: path.to_path_buf(),
                source: e,
            });
        }
    };

    file.write_all(content)
        .and_then(|_| file.sync_all())
        .map_err(|e| StorageError::WriteFile {
            path: path.to_path_buf(),
            source: e,
        })
}
