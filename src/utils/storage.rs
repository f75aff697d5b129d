//! Persistence of uploaded files in the upload directory.

use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::warn;
use thiserror::Error;
use tokio::fs::{self, File};
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("failed to create {}: {source}", .path.display())]
    Create {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Creates the upload directory if needed and checks that files can be created in it.
pub async fn prepare_upload_dir(dir: &Path) -> Result<()> {
    fs::create_dir_all(dir)
        .await
        .with_context(|| format!("failed to create upload directory {}", dir.display()))?;

    let check = dir.join(format!(".imgdrop-write-check-{}", Uuid::new_v4().simple()));
    fs::write(&check, b"")
        .await
        .with_context(|| format!("upload directory {} is not writable", dir.display()))?;
    fs::remove_file(&check)
        .await
        .with_context(|| format!("failed to remove {}", check.display()))?;
    Ok(())
}

/// Hidden temporary file that an upload is streamed into before it takes its final name.
///
/// A storage failure does not interrupt the caller: it is recorded and reported
/// by [`SpoolFile::commit`]. The temporary file is removed when the spool is
/// dropped without a successful commit.
pub struct SpoolFile {
    target: PathBuf,
    temp: PathBuf,
    file: Option<File>,
    error: Option<StorageError>,
    committed: bool,
}

impl SpoolFile {
    pub async fn create(dir: &Path, file_name: &str) -> Self {
        let target = dir.join(file_name);
        let temp = dir.join(format!(".{}.{}.part", file_name, Uuid::new_v4().simple()));

        let (file, error) = match File::create(&temp).await {
            Ok(file) => (Some(file), None),
            Err(source) => (
                None,
                Some(StorageError::Create {
                    path: temp.clone(),
                    source,
                }),
            ),
        };

        Self {
            target,
            temp,
            file,
            error,
            committed: false,
        }
    }

    pub async fn write(&mut self, chunk: &[u8]) {
        if self.error.is_some() {
            return;
        }
        if let Some(file) = self.file.as_mut() {
            if let Err(source) = file.write_all(chunk).await {
                self.file = None;
                self.error = Some(StorageError::Write {
                    path: self.target.clone(),
                    source,
                });
            }
        }
    }

    /// Syncs the data and renames it onto the final name, replacing any
    /// existing file of that name.
    pub async fn commit(mut self) -> Result<PathBuf, StorageError> {
        if let Some(err) = self.error.take() {
            return Err(err);
        }
        let file = self.file.take().ok_or_else(|| StorageError::Write {
            path: self.target.clone(),
            source: io::Error::other("spool file already closed"),
        })?;

        finish(file, &self.temp, &self.target)
            .await
            .map_err(|source| StorageError::Write {
                path: self.target.clone(),
                source,
            })?;

        self.committed = true;
        Ok(self.target.clone())
    }
}

impl Drop for SpoolFile {
    fn drop(&mut self) {
        if self.committed {
            return;
        }
        drop(self.file.take());
        if let Err(err) = std::fs::remove_file(&self.temp) {
            if err.kind() != io::ErrorKind::NotFound {
                warn!("failed to remove {}: {}", self.temp.display(), err);
            }
        }
    }
}

async fn finish(mut file: File, temp: &Path, target: &Path) -> io::Result<()> {
    file.flush().await?;
    file.sync_all().await?;
    drop(file);
    fs::rename(temp, target).await
}
